/// All errors that can be returned by a ForecastStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing document file could not be read or written.
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized for persistence.
    #[error("record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A backend-specific storage error (connection, driver, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
