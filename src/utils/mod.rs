//! Shared utilities.

pub mod fs;

pub use fs::{atomic_write, ensure_dir, remove_files_with_extension};
