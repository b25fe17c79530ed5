//! Blob store types.

/// Bytes to store, as declared by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUpload {
    pub bytes: Vec<u8>,
    pub name: String,
    pub content_type: String,
}

impl BlobUpload {
    pub fn new(bytes: Vec<u8>, name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            name: name.into(),
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Error type for blob store operations.
///
/// The split matters to callers: a [`BlobStoreError::Remote`] message came from the
/// storage service and is worth showing to the user verbatim, anything else is not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobStoreError {
    /// The service answered and reported a failure.
    #[error("{message}")]
    Remote { message: String },

    /// Network, configuration or any other failure on our side of the wire.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl BlobStoreError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl From<opendal::Error> for BlobStoreError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::PermissionDenied
            | ErrorKind::RateLimited
            | ErrorKind::AlreadyExists
            | ErrorKind::ConditionNotMatch
            | ErrorKind::NotFound => Self::remote(err.to_string()),
            _ => Self::transport(err.to_string()),
        }
    }
}
