pub mod codec;
pub mod config;
pub mod file_store;
