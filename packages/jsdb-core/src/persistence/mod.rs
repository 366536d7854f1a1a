//! File persistence: atomic whole-file JSON storage and I/O error handling.

pub mod io_utils;
mod json_file;

pub use json_file::JsonFile;
