//! Upload coordinator: dedup, placeholder lifecycle and the store call.

use imgdrop_input::HostFile;
use imgdrop_storage::{BlobStore, BlobStoreError, BlobUpload};

use crate::buffer::{Position, TextBuffer};
use crate::in_flight::{FileIdentity, InFlightGuard, InFlightSet};
use crate::messages;
use crate::placeholder::{
    PlaceholderId, Resolution, embed_markup, error_comment, insert_placeholder,
    resolve_placeholder,
};

/// An accepted file, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub identity: FileIdentity,
    pub bytes: Vec<u8>,
    pub name: String,
    pub content_type: String,
}

impl UploadRequest {
    pub fn from_file(file: HostFile) -> Self {
        let identity = FileIdentity::of(&file);
        Self {
            identity,
            bytes: file.bytes,
            name: file.name,
            content_type: file.mime_type,
        }
    }

    fn to_blob(&self) -> BlobUpload {
        BlobUpload::new(self.bytes.clone(), &self.name, &self.content_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The store answered with a structured error.
    RemoteApiError,
    UnknownTransportError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UploadFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadFailure {
    /// Text written in place of the placeholder.
    pub fn placeholder_text(&self) -> String {
        match self.kind {
            FailureKind::RemoteApiError => {
                error_comment(&messages::remote_upload_failure(&self.message))
            }
            FailureKind::UnknownTransportError => error_comment(messages::UNKNOWN_UPLOAD_FAILURE),
        }
    }
}

impl From<BlobStoreError> for UploadFailure {
    fn from(err: BlobStoreError) -> Self {
        let kind = if err.is_remote() {
            FailureKind::RemoteApiError
        } else {
            FailureKind::UnknownTransportError
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { url: String },
    Failed(UploadFailure),
    /// The same file was already uploading; nothing happened.
    DedupSkipped,
}

impl UploadOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Uploaded { url } => Some(url),
            Self::Failed(_) | Self::DedupSkipped => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Turns upload requests into outcomes against one [`BlobStore`].
pub struct UploadCoordinator<S> {
    store: S,
    in_flight: InFlightSet,
}

impl<S: BlobStore> UploadCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self::with_in_flight(store, InFlightSet::new())
    }

    /// Coordinator sharing an existing in-flight set, so a reconfigured store
    /// keeps deduplicating against uploads still running on the previous one.
    pub fn with_in_flight(store: S, in_flight: InFlightSet) -> Self {
        Self { store, in_flight }
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub fn claim(&self, identity: &FileIdentity) -> Option<InFlightGuard> {
        let guard = self.in_flight.claim(identity);
        if guard.is_none() {
            log::debug!(
                target: "imgdrop_business::coordinator",
                "dedup_skipped identity={identity}"
            );
        }
        guard
    }

    /// Uploads `request` with a placeholder at `at`, or over the selection.
    pub async fn upload(
        &self,
        request: UploadRequest,
        buffer: &dyn TextBuffer,
        at: Option<Position>,
    ) -> UploadOutcome {
        match self.claim(&request.identity) {
            Some(guard) => self.upload_claimed(guard, request, buffer, at).await,
            None => UploadOutcome::DedupSkipped,
        }
    }

    /// Second half of [`Self::upload`], for callers that claimed first.
    pub async fn upload_claimed(
        &self,
        guard: InFlightGuard,
        request: UploadRequest,
        buffer: &dyn TextBuffer,
        at: Option<Position>,
    ) -> UploadOutcome {
        let id = PlaceholderId::generate();
        insert_placeholder(buffer, &id, at);

        let result = self.store.store(request.to_blob()).await;
        drop(guard);

        let (outcome, final_text) = match result {
            Ok(url) => {
                log::debug!(
                    target: "imgdrop_business::coordinator",
                    "uploaded name={} url={url}",
                    request.name
                );
                let text = embed_markup(&url);
                (UploadOutcome::Uploaded { url }, text)
            }
            Err(err) => {
                log::error!(
                    target: "imgdrop_business::coordinator",
                    "upload_failed name={} error={err:?}",
                    request.name
                );
                let failure = UploadFailure::from(err);
                let text = failure.placeholder_text();
                (UploadOutcome::Failed(failure), text)
            }
        };

        if resolve_placeholder(buffer, &id, &final_text) == Resolution::Vanished {
            log::debug!(
                target: "imgdrop_business::coordinator",
                "result_discarded name={} placeholder={id}",
                request.name
            );
        }
        outcome
    }

    /// Uploads without touching any buffer.
    pub async fn upload_detached(&self, request: UploadRequest) -> UploadOutcome {
        let Some(guard) = self.claim(&request.identity) else {
            return UploadOutcome::DedupSkipped;
        };

        let result = self.store.store(request.to_blob()).await;
        drop(guard);

        match result {
            Ok(url) => UploadOutcome::Uploaded { url },
            Err(err) => {
                log::error!(
                    target: "imgdrop_business::coordinator",
                    "upload_failed name={} error={err:?}",
                    request.name
                );
                UploadOutcome::Failed(err.into())
            }
        }
    }
}
