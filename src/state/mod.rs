// State management module
// Handles output directories, atomic writes and content hashing

pub mod storage;

pub use storage::{
    calculate_sha256, ensure_dir, read_file, require_dir, write_atomic, StorageError,
    StorageResult,
};
