use crate::buffer::buffer_pool_manager::{FileId, PageId};
use crate::storage::errors::StorageResult;

/// The backing-file collaborator consumed by the buffer pool. It performs
/// the actual byte-level transfers and owns page allocation on the
/// backing store; the cache never touches storage any other way.
///
/// Files are compared by `FileId` handle equality, never by content.
pub trait FileStore {
    /// Create a new backing file and hand out its identity.
    fn create_file(&mut self) -> StorageResult<FileId>;

    /// Allocate a fresh (zero-filled) logical page in `file_id`.
    fn allocate_page(&mut self, file_id: FileId) -> StorageResult<PageId>;

    /// Read one page's bytes into `buf` (exactly one page long).
    fn read_page(&mut self, file_id: FileId, page_id: PageId, buf: &mut [u8])
        -> StorageResult<()>;

    /// Write one page's bytes from `data` (exactly one page long).
    fn write_page(&mut self, file_id: FileId, page_id: PageId, data: &[u8]) -> StorageResult<()>;

    /// Deallocate a logical page on the backing store.
    fn dispose_page(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<()>;
}
