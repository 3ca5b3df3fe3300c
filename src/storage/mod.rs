pub mod disk;
pub mod errors;
pub mod page;
