pub mod page_constants {
    // Frames, on-disk slots and I/O transfers all move exactly one page.
    pub const PAGE_SIZE: usize = 1024 * 4;
}

use page_constants::PAGE_SIZE;

/// One page-sized memory slot. The buffer pool allocates all of its slots
/// once at construction and overwrites them in place; no slot is ever
/// freed on its own.
pub struct Page {
    pub data: Box<[u8]>,
}

impl Page {
    pub fn new() -> Self {
        Page {
            data: vec![0u8; PAGE_SIZE].into_boxed_slice(),
        }
    }

    pub fn zero(&mut self) {
        self.data.fill(0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}
