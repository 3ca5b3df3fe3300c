use std::fmt;

/// Every fallible cache operation reports one of these kinds, so callers
/// can tell a protocol mistake of their own from a failed disk.
#[derive(Debug)]
pub enum StorageError {
    /// A backing-file read or write failed.
    Io { message: String },

    /// Every frame in the pool is pinned; nothing can be evicted.
    BufferExceeded,

    /// The page index and the frame table disagree. This is a bug in the
    /// cache itself, not something a caller can recover from.
    HashTableError { reason: String },

    PageNotFound { file_id: u64, page_id: u32 },

    /// Unpin called on a page with no outstanding pin.
    PageNotPinned { file_id: u64, page_id: u32 },

    /// Flush blocked by an active holder.
    PagePinned { file_id: u64, page_id: u32 },

    /// A frame claims state it cannot legally hold.
    BadBuffer { frame_id: u32 },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io { message } => {
                write!(f, "storage IO error: {}", message)
            }

            StorageError::BufferExceeded => {
                write!(f, "buffer error: all frames are pinned")
            }

            StorageError::HashTableError { reason } => {
                write!(f, "buffer error: page index inconsistency ({})", reason)
            }

            StorageError::PageNotFound { file_id, page_id } => {
                write!(
                    f,
                    "buffer error: page {} of file {} not in cache",
                    page_id, file_id
                )
            }

            StorageError::PageNotPinned { file_id, page_id } => {
                write!(
                    f,
                    "buffer error: page {} of file {} is not pinned",
                    page_id, file_id
                )
            }

            StorageError::PagePinned { file_id, page_id } => {
                write!(
                    f,
                    "buffer error: page {} of file {} is still pinned",
                    page_id, file_id
                )
            }

            StorageError::BadBuffer { frame_id } => {
                write!(f, "buffer error: frame {} is in a malformed state", frame_id)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}
