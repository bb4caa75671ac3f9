pub mod config;
pub mod error;
pub mod hosts;
pub mod kafka;
pub mod source;
pub mod storage;
