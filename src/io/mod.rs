pub mod config_io;
pub mod export;
pub mod lock;
pub mod paths;
pub mod store;
pub mod watcher;
