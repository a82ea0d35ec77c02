use thiserror::Error;

/// Failures of the key/value persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read `{key}`: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Error reported by a host-provided backend.
    #[error("storage backend error for `{key}`: {message}")]
    Backend { key: String, message: String },
}

impl StorageError {
    pub fn key(&self) -> &str {
        match self {
            StorageError::Read { key, .. }
            | StorageError::Write { key, .. }
            | StorageError::Decode { key, .. }
            | StorageError::Encode { key, .. }
            | StorageError::Backend { key, .. } => key,
        }
    }
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("malformed url `{url}`: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
