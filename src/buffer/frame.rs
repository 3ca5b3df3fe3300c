use crate::buffer::buffer_pool_manager::{FileId, FrameId, PageId};

/// Per-frame bookkeeping, index-aligned with the frame pool. This table is
/// the authoritative state machine for every frame: a frame is free, or it
/// holds a resident page that may be pinned, dirty or recently referenced.
#[derive(Debug)]
pub struct FrameDesc {
    pub frame_id: FrameId,
    pub file_id: Option<FileId>,

    // Only meaningful while `file_id` is set.
    pub page_id: PageId,

    // Number of outstanding holders. A pinned frame is never evicted.
    pub pin_count: u32,

    // Frame contents differ from what is on backing storage.
    pub dirty: bool,

    // Second-chance signal: touched since the clock hand last swept past.
    pub ref_bit: bool,

    pub valid: bool,
}

impl FrameDesc {
    pub fn new(frame_id: FrameId) -> Self {
        FrameDesc {
            frame_id,
            file_id: None,
            page_id: 0,
            pin_count: 0,
            dirty: false,
            ref_bit: false,
            valid: false,
        }
    }

    /// A page was just loaded into this frame: resident, pinned once,
    /// clean, and referenced.
    pub fn set(&mut self, file_id: FileId, page_id: PageId) {
        self.file_id = Some(file_id);
        self.page_id = page_id;
        self.pin_count = 1;
        self.dirty = false;
        self.ref_bit = true;
        self.valid = true;
    }

    /// Return the frame to the free state. A free frame carries no stale
    /// pin, dirty or reference state.
    pub fn clear(&mut self) {
        self.file_id = None;
        self.page_id = 0;
        self.pin_count = 0;
        self.dirty = false;
        self.ref_bit = false;
        self.valid = false;
    }
}

#[cfg(test)]
pub mod test {
    use super::FrameDesc;

    #[test]
    fn set_and_clear_transitions() {
        let mut desc = FrameDesc::new(3);
        assert!(!desc.valid);
        assert_eq!(0, desc.pin_count);
        assert!(!desc.dirty);
        assert!(!desc.ref_bit);

        desc.set(7, 42);
        assert!(desc.valid);
        assert_eq!(Some(7), desc.file_id);
        assert_eq!(42, desc.page_id);
        assert_eq!(1, desc.pin_count);
        assert!(desc.ref_bit);
        assert!(!desc.dirty);

        desc.pin_count += 1;
        desc.dirty = true;

        // A cleared frame holds no trace of its previous occupant.
        desc.clear();
        assert!(!desc.valid);
        assert_eq!(None, desc.file_id);
        assert_eq!(0, desc.pin_count);
        assert!(!desc.dirty);
        assert!(!desc.ref_bit);
    }
}
