//! Database configuration.

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Write the document as indented JSON
    pub pretty_json: bool,
    /// fsync the temporary file before renaming it over the database file
    pub sync_on_write: bool,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            pretty_json: false,
            sync_on_write: true,
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}
