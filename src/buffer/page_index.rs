use hashlink::LinkedHashMap;

use crate::buffer::buffer_pool_manager::{FileId, FrameId, PageId};
use crate::storage::errors::{StorageError, StorageResult};

/// Maps logical page identity to the frame currently holding it. For every
/// resident frame there is exactly one entry here and vice versa; the
/// buffer pool keeps the two structures in lockstep.
pub struct PageIndex {
    entries: LinkedHashMap<(FileId, PageId), FrameId>,
}

impl PageIndex {
    /// Sized with headroom over the frame count to keep collision chains
    /// short.
    pub fn new(num_frames: usize) -> Self {
        let capacity = num_frames + num_frames / 5 + 1;

        PageIndex {
            entries: LinkedHashMap::with_capacity(capacity),
        }
    }

    pub fn lookup(&self, file_id: FileId, page_id: PageId) -> Option<FrameId> {
        self.entries.get(&(file_id, page_id)).copied()
    }

    pub fn insert(
        &mut self,
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    ) -> StorageResult<()> {
        if self.entries.contains_key(&(file_id, page_id)) {
            return Err(StorageError::HashTableError {
                reason: format!("duplicate entry for page {} of file {}", page_id, file_id),
            });
        }

        self.entries.insert((file_id, page_id), frame_id);
        Ok(())
    }

    pub fn remove(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<()> {
        self.entries
            .remove(&(file_id, page_id))
            .map(|_| ())
            .ok_or(StorageError::PageNotFound { file_id, page_id })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub mod test {
    use super::PageIndex;
    use crate::storage::errors::StorageError;

    #[test]
    fn insert_lookup_remove() {
        let mut index = PageIndex::new(8);

        index.insert(1, 10, 0).unwrap();
        index.insert(1, 11, 1).unwrap();
        index.insert(2, 10, 2).unwrap();

        assert_eq!(Some(0), index.lookup(1, 10));
        assert_eq!(Some(2), index.lookup(2, 10));
        assert_eq!(None, index.lookup(2, 11));
        assert_eq!(3, index.len());

        index.remove(1, 10).unwrap();
        assert_eq!(None, index.lookup(1, 10));
        assert_eq!(2, index.len());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut index = PageIndex::new(4);

        index.insert(1, 10, 0).unwrap();
        let err = index.insert(1, 10, 3).unwrap_err();

        assert!(matches!(err, StorageError::HashTableError { .. }));
        // The original mapping survives the failed insert.
        assert_eq!(Some(0), index.lookup(1, 10));
    }

    #[test]
    fn remove_missing_reports_not_found() {
        let mut index = PageIndex::new(4);

        let err = index.remove(9, 9).unwrap_err();
        assert!(matches!(err, StorageError::PageNotFound { .. }));
    }
}
