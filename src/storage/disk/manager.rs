use std::{
    collections::{HashMap, VecDeque},
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use hashlink::LinkedHashMap;

use crate::buffer::buffer_pool_manager::{FileId, PageId};
use crate::storage::disk::file::FileStore;
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::page::page::page_constants::PAGE_SIZE;

struct FileMeta {
    io: File,

    // A mapping from page_id to its offset on disk. The option marks
    // deallocated pages: their slots are recycled and handed to newly
    // allocated pages before the file grows.
    pages: LinkedHashMap<PageId, Option<u64>>,

    // The id and offset of every dead slot waiting for reuse.
    free_slots: VecDeque<(PageId, u64)>,
}

/// File-backed page store: one backing file per `FileId` under a data
/// directory, pages laid out at page-aligned offsets.
pub struct DiskManager {
    data_dir: PathBuf,
    files: HashMap<FileId, FileMeta>,

    // Monotonically increasing file identifier.
    next_file_id: u64,
}

impl DiskManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        Ok(DiskManager {
            data_dir,
            files: HashMap::new(),
            next_file_id: 0,
        })
    }

    fn file_meta(&mut self, file_id: FileId) -> StorageResult<&mut FileMeta> {
        self.files.get_mut(&file_id).ok_or_else(|| StorageError::Io {
            message: format!("file {} not found", file_id),
        })
    }

    fn page_offset(meta: &FileMeta, file_id: FileId, page_id: PageId) -> StorageResult<u64> {
        let offset = match meta.pages.get(&page_id) {
            Some(Some(offset)) => *offset,
            Some(None) => {
                return Err(StorageError::Io {
                    message: format!("page {} of file {} has been deallocated", page_id, file_id),
                })
            }
            None => {
                return Err(StorageError::Io {
                    message: format!("page {} of file {} has not been allocated", page_id, file_id),
                })
            }
        };

        if offset % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::Io {
                message: format!("invalid offset {} (must be page aligned)", offset),
            });
        }

        Ok(offset)
    }
}

impl FileStore for DiskManager {
    fn create_file(&mut self) -> StorageResult<FileId> {
        let file_id = self.next_file_id;
        self.next_file_id += 1;

        let path = self.data_dir.join(format!("{}.bin", file_id));
        let io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        self.files.insert(
            file_id,
            FileMeta {
                io,
                pages: LinkedHashMap::new(),
                free_slots: VecDeque::new(),
            },
        );

        Ok(file_id)
    }

    fn allocate_page(&mut self, file_id: FileId) -> StorageResult<PageId> {
        let meta = self.file_meta(file_id)?;

        // Recycle a dead slot before growing the file.
        let (page_id, offset) = match meta.free_slots.pop_front() {
            Some((page_id, offset)) => {
                meta.pages.replace(page_id, Some(offset));
                (page_id, offset)
            }
            None => {
                let page_id = meta.pages.len() as PageId;
                let offset = page_id as u64 * PAGE_SIZE as u64;
                meta.pages.insert(page_id, Some(offset));
                (page_id, offset)
            }
        };

        // New pages read back as zeroes, recycled slots included.
        meta.io.seek(SeekFrom::Start(offset))?;
        meta.io.write_all(&[0u8; PAGE_SIZE])?;
        meta.io.flush()?;

        Ok(page_id)
    }

    fn read_page(
        &mut self,
        file_id: FileId,
        page_id: PageId,
        buf: &mut [u8],
    ) -> StorageResult<()> {
        let meta = self.file_meta(file_id)?;
        let offset = Self::page_offset(meta, file_id, page_id)?;

        meta.io.seek(SeekFrom::Start(offset))?;
        meta.io.read_exact(buf)?;

        Ok(())
    }

    fn write_page(&mut self, file_id: FileId, page_id: PageId, data: &[u8]) -> StorageResult<()> {
        let meta = self.file_meta(file_id)?;
        let offset = Self::page_offset(meta, file_id, page_id)?;

        meta.io.seek(SeekFrom::Start(offset))?;
        meta.io.write_all(data)?;
        meta.io.flush()?;

        Ok(())
    }

    fn dispose_page(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<()> {
        let meta = self.file_meta(file_id)?;

        match meta.pages.get(&page_id).copied() {
            Some(Some(offset)) => {
                meta.pages.replace(page_id, None);
                meta.free_slots.push_back((page_id, offset));
                Ok(())
            }
            Some(None) => Err(StorageError::Io {
                message: format!("page {} of file {} already deallocated", page_id, file_id),
            }),
            None => Err(StorageError::Io {
                message: format!("page {} of file {} not allocated", page_id, file_id),
            }),
        }
    }
}

#[cfg(test)]
pub mod test {
    use std::fs::remove_dir_all;
    use std::path::PathBuf;

    use super::DiskManager;
    use crate::storage::disk::file::FileStore;
    use crate::storage::page::page::page_constants::PAGE_SIZE;

    fn test_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quarry_{}_{}", name, std::process::id()))
    }

    #[test]
    fn db_io_round_trip() {
        let dir = test_dir("db_io");
        let mut manager = DiskManager::new(&dir).unwrap();

        let file_id = manager.create_file().expect("file made");
        let page_id = manager.allocate_page(file_id).unwrap();

        let data = [7u8; PAGE_SIZE];
        let mut buffer = [0u8; PAGE_SIZE];

        manager.write_page(file_id, page_id, &data).unwrap();
        manager
            .read_page(file_id, page_id, &mut buffer)
            .expect("failed to read page");

        assert_eq!(data, buffer, "page read mismatch");

        remove_dir_all(dir).unwrap();
    }

    #[test]
    fn disposed_slots_are_recycled() {
        let dir = test_dir("recycle");
        let mut manager = DiskManager::new(&dir).unwrap();

        let file_id = manager.create_file().unwrap();
        let p0 = manager.allocate_page(file_id).unwrap();
        let p1 = manager.allocate_page(file_id).unwrap();
        assert_ne!(p0, p1);

        manager
            .write_page(file_id, p0, &[9u8; PAGE_SIZE])
            .unwrap();
        manager.dispose_page(file_id, p0).unwrap();

        // Reading a dead page fails until the slot is reallocated.
        let mut buffer = [0u8; PAGE_SIZE];
        assert!(manager.read_page(file_id, p0, &mut buffer).is_err());

        let recycled = manager.allocate_page(file_id).unwrap();
        assert_eq!(p0, recycled);

        // The recycled slot comes back zeroed.
        manager.read_page(file_id, recycled, &mut buffer).unwrap();
        assert_eq!([0u8; PAGE_SIZE], buffer);

        remove_dir_all(dir).unwrap();
    }
}
