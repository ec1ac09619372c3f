pub mod backend;
pub mod format;
pub mod manager;
