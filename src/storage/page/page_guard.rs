use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use crate::buffer::buffer_pool_manager::{BufferPoolManager, FileId, FrameId, PageId};
use crate::storage::errors::StorageResult;

/// Shared single-mutator handle to the buffer pool. Guards hold a clone of
/// the handle, so every pin taken out through here is returned on every
/// exit path, including early returns. Forgetting an unpin is no longer
/// expressible.
pub struct PageCache {
    inner: Rc<RefCell<BufferPoolManager>>,
}

impl PageCache {
    pub fn new(pool: BufferPoolManager) -> Self {
        PageCache {
            inner: Rc::new(RefCell::new(pool)),
        }
    }

    pub fn allocate_file(&self) -> StorageResult<FileId> {
        self.inner.borrow_mut().allocate_file()
    }

    /// Pin a page for reading. The pin is dropped with the guard.
    pub fn read_page(&self, file_id: FileId, page_id: PageId) -> StorageResult<ReadGuard> {
        let frame_id = self.inner.borrow_mut().fetch_page(file_id, page_id)?;

        Ok(ReadGuard {
            cache: Rc::clone(&self.inner),
            file_id,
            page_id,
            frame_id,
        })
    }

    /// Pin a page for writing. Dropping the guard unpins the page dirty.
    pub fn write_page(&self, file_id: FileId, page_id: PageId) -> StorageResult<WriteGuard> {
        let frame_id = self.inner.borrow_mut().fetch_page(file_id, page_id)?;

        Ok(WriteGuard {
            cache: Rc::clone(&self.inner),
            file_id,
            page_id,
            frame_id,
        })
    }

    /// Allocate a fresh page and return it pinned for writing.
    pub fn new_page(&self, file_id: FileId) -> StorageResult<(PageId, WriteGuard)> {
        let (page_id, frame_id) = self.inner.borrow_mut().new_page(file_id)?;

        let guard = WriteGuard {
            cache: Rc::clone(&self.inner),
            file_id,
            page_id,
            frame_id,
        };

        Ok((page_id, guard))
    }

    pub fn delete_page(&self, file_id: FileId, page_id: PageId) -> StorageResult<()> {
        self.inner.borrow_mut().delete_page(file_id, page_id)
    }

    pub fn flush_file(&self, file_id: FileId) -> StorageResult<()> {
        self.inner.borrow_mut().flush_file(file_id)
    }

    pub fn pin_count(&self, file_id: FileId, page_id: PageId) -> Option<u32> {
        self.inner.borrow().pin_count(file_id, page_id)
    }

    pub fn dump(&self) -> String {
        self.inner.borrow().dump()
    }
}

/// One read pin on a resident page.
pub struct ReadGuard {
    cache: Rc<RefCell<BufferPoolManager>>,
    file_id: FileId,
    page_id: PageId,
    frame_id: FrameId,
}

impl std::fmt::Debug for ReadGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("file_id", &self.file_id)
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

impl ReadGuard {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> Ref<'_, [u8]> {
        let frame_id = self.frame_id;
        Ref::map(self.cache.borrow(), |pool| pool.frame_data(frame_id))
    }
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        let _ = self
            .cache
            .borrow_mut()
            .unpin_page(self.file_id, self.page_id, false);
    }
}

/// One write pin on a resident page. The page is marked dirty when the
/// guard drops, whether or not it was actually written.
pub struct WriteGuard {
    cache: Rc<RefCell<BufferPoolManager>>,
    file_id: FileId,
    page_id: PageId,
    frame_id: FrameId,
}

impl WriteGuard {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> Ref<'_, [u8]> {
        let frame_id = self.frame_id;
        Ref::map(self.cache.borrow(), |pool| pool.frame_data(frame_id))
    }

    pub fn data_mut(&mut self) -> RefMut<'_, [u8]> {
        let frame_id = self.frame_id;
        RefMut::map(self.cache.borrow_mut(), |pool| pool.frame_data_mut(frame_id))
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let _ = self
            .cache
            .borrow_mut()
            .unpin_page(self.file_id, self.page_id, true);
    }
}
