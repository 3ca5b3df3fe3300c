use std::fmt::Write;

use crate::{
    buffer::{frame::FrameDesc, page_index::PageIndex},
    storage::{
        disk::file::FileStore,
        errors::{StorageError, StorageResult},
        page::page::Page,
    },
    utils::replacer::{ClockReplacer, Replacer, Victim},
};

pub type FrameId = u32;
pub type PageId = u32;
pub type FileId = u64;

/// The in-memory page cache. Every page access goes through here: a
/// bounded pool of frames, a descriptor per frame, an identity index, and
/// a clock replacer deciding who gets evicted when the pool is full.
///
/// All operations take `&mut self`: the cache assumes a single logical
/// mutator and provides no serialization of its own. Its one
/// concurrency-adjacent guarantee is the pin protocol: a frame with an
/// outstanding pin is never selected as a victim.
pub struct BufferPoolManager {
    num_frames: usize,

    // The frame pool and its descriptor table, index-aligned, allocated
    // once for the life of the cache.
    pool: Vec<Page>,
    frames: Vec<FrameDesc>,

    page_index: PageIndex,
    replacer: ClockReplacer,

    store: Box<dyn FileStore>,
}

impl BufferPoolManager {
    pub fn new(num_frames: usize, store: Box<dyn FileStore>) -> Self {
        let pool = (0..num_frames).map(|_| Page::new()).collect();
        let frames = (0..num_frames)
            .map(|i| FrameDesc::new(i as FrameId))
            .collect();

        Self {
            num_frames,
            pool,
            frames,
            page_index: PageIndex::new(num_frames),
            replacer: ClockReplacer::new(num_frames),
            store,
        }
    }

    /// Create a new backing file on the store.
    pub fn allocate_file(&mut self) -> StorageResult<FileId> {
        self.store.create_file()
    }

    /// Victim selection shared by the fetch-miss and new-page paths. On
    /// success the returned frame is free: a previously resident occupant
    /// has been written back if dirty and dropped from the page index.
    fn grab_frame(&mut self) -> StorageResult<FrameId> {
        let frame_id = match self.replacer.pick_victim(&mut self.frames)? {
            Victim::Free(frame_id) => frame_id,

            Victim::Evict(frame_id) => {
                let idx = frame_id as usize;

                let file_id = self.frames[idx]
                    .file_id
                    .ok_or(StorageError::BadBuffer { frame_id })?;
                let page_id = self.frames[idx].page_id;

                if self.frames[idx].dirty {
                    self.store
                        .write_page(file_id, page_id, &self.pool[idx].data)?;
                    self.frames[idx].dirty = false;
                }

                if self.page_index.remove(file_id, page_id).is_err() {
                    return Err(StorageError::HashTableError {
                        reason: format!(
                            "no index entry for evicted page {} of file {}",
                            page_id, file_id
                        ),
                    });
                }

                self.frames[idx].clear();
                frame_id
            }
        };

        Ok(frame_id)
    }

    /// Pin a page into a frame, loading it from the store on a miss. The
    /// caller owes exactly one `unpin_page` for every successful fetch.
    pub fn fetch_page(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<FrameId> {
        if let Some(frame_id) = self.page_index.lookup(file_id, page_id) {
            let desc = &mut self.frames[frame_id as usize];
            if !desc.valid {
                return Err(StorageError::BadBuffer { frame_id });
            }

            desc.ref_bit = true;
            desc.pin_count += 1;
            return Ok(frame_id);
        }

        let frame_id = self.grab_frame()?;
        let idx = frame_id as usize;

        // A failed read leaves the frame free with no index entry.
        self.store
            .read_page(file_id, page_id, &mut self.pool[idx].data)?;

        self.page_index.insert(file_id, page_id, frame_id)?;
        self.frames[idx].set(file_id, page_id);

        Ok(frame_id)
    }

    /// Drop one pin. `dirty` is sticky: once a holder marks the page
    /// dirty, only a write-back clears it.
    pub fn unpin_page(
        &mut self,
        file_id: FileId,
        page_id: PageId,
        dirty: bool,
    ) -> StorageResult<()> {
        let frame_id = self
            .page_index
            .lookup(file_id, page_id)
            .ok_or(StorageError::PageNotFound { file_id, page_id })?;

        let desc = &mut self.frames[frame_id as usize];
        if desc.pin_count == 0 {
            return Err(StorageError::PageNotPinned { file_id, page_id });
        }

        desc.pin_count -= 1;
        if dirty {
            desc.dirty = true;
        }

        Ok(())
    }

    /// Allocate a fresh page on the store and pin it into a zeroed frame.
    pub fn new_page(&mut self, file_id: FileId) -> StorageResult<(PageId, FrameId)> {
        let page_id = self.store.allocate_page(file_id)?;

        let frame_id = self.grab_frame()?;
        let idx = frame_id as usize;

        self.pool[idx].zero();
        self.page_index.insert(file_id, page_id, frame_id)?;
        self.frames[idx].set(file_id, page_id);

        Ok((page_id, frame_id))
    }

    /// Drop a page from the cache and deallocate it on the store. This is
    /// a forced release: the pin protocol does not apply here.
    pub fn delete_page(&mut self, file_id: FileId, page_id: PageId) -> StorageResult<()> {
        if let Some(frame_id) = self.page_index.lookup(file_id, page_id) {
            self.frames[frame_id as usize].clear();
            self.page_index.remove(file_id, page_id)?;
        }

        self.store.dispose_page(file_id, page_id)
    }

    /// Write back and drop every resident page of `file_id`. Fails up
    /// front with `PagePinned` if any of them has an active holder; on
    /// success the file has no frames and no index entries left.
    pub fn flush_file(&mut self, file_id: FileId) -> StorageResult<()> {
        for idx in 0..self.num_frames {
            if self.frames[idx].valid {
                if self.frames[idx].file_id != Some(file_id) {
                    continue;
                }
                let page_id = self.frames[idx].page_id;

                if self.frames[idx].pin_count > 0 {
                    return Err(StorageError::PagePinned { file_id, page_id });
                }

                if self.frames[idx].dirty {
                    self.store
                        .write_page(file_id, page_id, &self.pool[idx].data)?;
                    self.frames[idx].dirty = false;
                }

                if self.page_index.remove(file_id, page_id).is_err() {
                    return Err(StorageError::HashTableError {
                        reason: format!(
                            "no index entry for flushed page {} of file {}",
                            page_id, file_id
                        ),
                    });
                }

                self.frames[idx].clear();
            } else if self.frames[idx].file_id == Some(file_id) {
                // A free frame must not claim ownership of a file.
                return Err(StorageError::BadBuffer {
                    frame_id: idx as FrameId,
                });
            }
        }

        Ok(())
    }

    pub fn frame_data(&self, frame_id: FrameId) -> &[u8] {
        &self.pool[frame_id as usize].data
    }

    /// Mutable access to a frame's bytes. The caller must hold a pin on
    /// the frame and mark the page dirty when unpinning.
    pub fn frame_data_mut(&mut self, frame_id: FrameId) -> &mut [u8] {
        &mut self.pool[frame_id as usize].data
    }

    /// The pin count of a resident page, or None if it is not cached.
    pub fn pin_count(&self, file_id: FileId, page_id: PageId) -> Option<u32> {
        let frame_id = self.page_index.lookup(file_id, page_id)?;
        Some(self.frames[frame_id as usize].pin_count)
    }

    /// Per-frame pin count and validity, for debugging only. No contract
    /// on the output format.
    pub fn dump(&self) -> String {
        let mut out = String::new();

        for desc in &self.frames {
            let _ = writeln!(
                out,
                "frame {}\tpin_count: {}\t{}",
                desc.frame_id,
                desc.pin_count,
                if desc.valid { "valid" } else { "free" }
            );
        }

        out
    }
}

impl Drop for BufferPoolManager {
    /// Best-effort write-back of whatever is still dirty. A failure here
    /// is not surfaced: the cache is being torn down and no caller
    /// remains to receive it.
    fn drop(&mut self) {
        for idx in 0..self.num_frames {
            let desc = &self.frames[idx];
            if desc.valid && desc.dirty {
                if let Some(file_id) = desc.file_id {
                    let _ = self
                        .store
                        .write_page(file_id, desc.page_id, &self.pool[idx].data);
                }
            }
        }
    }
}
