use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::buffer::buffer_pool_manager::{FileId, PageId};
use crate::storage::disk::file::FileStore;
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::page::page::page_constants::PAGE_SIZE;

#[derive(Default)]
struct MemFile {
    // One slot per allocated page; None marks a deallocated slot that the
    // next allocation recycles.
    pages: Vec<Option<Vec<u8>>>,
}

#[derive(Default)]
struct MemStoreInner {
    files: HashMap<FileId, MemFile>,
    next_file_id: u64,

    // Every successful page write, in order.
    write_log: Vec<(FileId, PageId)>,

    fail_writes: u32,
    fail_reads: u32,
}

/// In-memory backing store. Clones share state, so a test can keep a probe
/// handle to inspect persisted bytes or schedule failures after handing
/// the store to the buffer pool.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Rc<RefCell<MemStoreInner>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Fail the next `n` page writes with an I/O error.
    pub fn fail_next_writes(&self, n: u32) {
        self.inner.borrow_mut().fail_writes = n;
    }

    /// Fail the next `n` page reads with an I/O error.
    pub fn fail_next_reads(&self, n: u32) {
        self.inner.borrow_mut().fail_reads = n;
    }

    pub fn write_log(&self) -> Vec<(FileId, PageId)> {
        self.inner.borrow().write_log.clone()
    }

    /// The persisted bytes of a page, if it is currently allocated.
    pub fn page_bytes(&self, file_id: FileId, page_id: PageId) -> Option<Vec<u8>> {
        self.inner
            .borrow()
            .files
            .get(&file_id)?
            .pages
            .get(page_id as usize)?
            .clone()
    }
}

impl FileStore for MemStore {
    fn create_file(&mut self) -> StorageResult<FileId> {
        let mut inner = self.inner.borrow_mut();
        let file_id = inner.next_file_id;
        inner.next_file_id += 1;
        inner.files.insert(file_id, MemFile::default());
        Ok(file_id)
    }

    fn allocate_page(&mut self, file_id: FileId) -> StorageResult<PageId> {
        let mut inner = self.inner.borrow_mut();
        let file = inner.files.get_mut(&file_id).ok_or_else(|| StorageError::Io {
            message: format!("file {} not found", file_id),
        })?;

        // Recycle the first dead slot before growing the file.
        if let Some(slot) = file.pages.iter().position(Option::is_none) {
            file.pages[slot] = Some(vec![0u8; PAGE_SIZE]);
            return Ok(slot as PageId);
        }

        file.pages.push(Some(vec![0u8; PAGE_SIZE]));
        Ok((file.pages.len() - 1) as PageId)
    }

    fn read_page(
        &mut self,
        file_id: FileId,
        page_id: PageId,
        buf: &mut [u8],
    ) -> StorageResult<()> {
        let mut inner = self.inner.borrow_mut();

        if inner.fail_reads > 0 {
            inner.fail_reads -= 1;
            return Err(StorageError::Io {
                message: format!("injected read failure for page {}", page_id),
            });
        }

        let file = inner.files.get(&file_id).ok_or_else(|| StorageError::Io {
            message: format!("file {} not found", file_id),
        })?;

        let page = file
            .pages
            .get(page_id as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| StorageError::Io {
                message: format!("page {} of file {} not allocated", page_id, file_id),
            })?;

        buf.copy_from_slice(page);
        Ok(())
    }

    fn write_page(&mut self, file_id: FileId, page_id: PageId, data: &[u8]) -> StorageResult<()> {
        let mut inner = self.inner.borrow_mut();

        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(StorageError::Io {
                message: format!("injected write failure for page {}", page_id),
            });
        }

        let file = inner.files.get_mut(&file_id).ok_or_else(|| StorageError::Io {
            message: format!("file {} not found", file_id),
        })?;

        let page = file
            .pages
            .get_mut(page_id as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| StorageError::Io {
                message: format!("page {} of file {} not allocated", page_id, file_id),
            })?;

        page.copy_from_slice(data);
        inner.write_log.push((file_id, page_id));
        Ok(())
    }

    fn dispose_page(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<()> {
        let mut inner = self.inner.borrow_mut();
        let file = inner.files.get_mut(&file_id).ok_or_else(|| StorageError::Io {
            message: format!("file {} not found", file_id),
        })?;

        match file.pages.get_mut(page_id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(StorageError::Io {
                message: format!("page {} of file {} not allocated", page_id, file_id),
            }),
        }
    }
}
