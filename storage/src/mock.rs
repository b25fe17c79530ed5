//! Mock blob store for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use super::traits::BlobStore;
use super::types::{BlobStoreError, BlobUpload};

/// URL prefix of the objects stored by [`MockBlobStore`] unless overridden.
pub const MOCK_URL_PREFIX: &str = "https://mock.blob/";

/// In-memory `BlobStore` for testing.
///
/// Records each call, can be scripted to fail, and can hold calls pending until
/// [`MockBlobStore::release`] so tests can look at the world mid-upload.
#[derive(Clone, Default)]
pub struct MockBlobStore {
    state: Arc<Mutex<MockState>>,
    release: Arc<Notify>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<BlobUpload>,
    failures: VecDeque<BlobStoreError>,
    url: Option<String>,
    held: bool,
    pending: usize,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("lock poisoned")
    }

    /// Every successful call returns this URL instead of a generated one.
    pub fn respond_with_url(&self, url: impl Into<String>) {
        self.state().url = Some(url.into());
    }

    /// The next call fails with `err`. Queued failures are consumed in order.
    pub fn fail_next_with(&self, err: BlobStoreError) {
        self.state().failures.push_back(err);
    }

    /// Calls made from now on stay pending until [`Self::release`].
    pub fn hold(&self) {
        self.state().held = true;
    }

    /// Lets every held call complete.
    pub fn release(&self) {
        self.state().held = false;
        self.release.notify_waiters();
    }

    /// Uploads received so far, in call order.
    pub fn calls(&self) -> Vec<BlobUpload> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Calls currently waiting on a [`Self::hold`].
    pub fn pending(&self) -> usize {
        self.state().pending
    }
}

impl BlobStore for MockBlobStore {
    async fn store(&self, upload: BlobUpload) -> Result<String, BlobStoreError> {
        {
            let mut state = self.state();
            state.calls.push(upload.clone());
            state.pending += 1;
        }

        loop {
            let released = self.release.notified();
            if !self.state().held {
                break;
            }
            released.await;
        }

        let mut state = self.state();
        state.pending -= 1;

        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }

        Ok(state
            .url
            .clone()
            .unwrap_or_else(|| format!("{MOCK_URL_PREFIX}{}", upload.name)))
    }
}
