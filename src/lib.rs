pub mod buffer;
pub mod storage;
pub mod utils;
