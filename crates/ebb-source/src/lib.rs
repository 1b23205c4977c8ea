//! Incremental build orchestration for ebb content.
//!
//! Discovers MDX sources, compiles the ones whose modification time changed
//! since the last run and writes a lazy-loading content index.

pub mod builder;
pub mod cache;
pub mod config;
pub mod index;
pub mod watcher;

pub use builder::{BuildError, BuildMode, BuildReport, CompileError, FileStatus, SourceBuilder};
pub use cache::{CacheError, CacheMap};
pub use config::{ConfigError, SourceConfig, CONFIG_FILE};
pub use index::generate_index;
pub use watcher::{FileWatcher, WatchEvent};
