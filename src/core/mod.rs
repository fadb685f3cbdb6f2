pub mod config;
pub mod error;
pub mod extract;
pub mod shared;
pub mod storage;
