//! Fingerprints of the uploads currently in flight.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use imgdrop_input::HostFile;

/// Deduplication fingerprint of a file.
///
/// Two files with the same name, size, declared type and modification time
/// are treated as the same upload, whatever their content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub last_modified: i64,
}

impl FileIdentity {
    pub fn of(file: &HostFile) -> Self {
        Self {
            name: file.name.clone(),
            size: file.size(),
            mime_type: file.mime_type.clone(),
            last_modified: file.last_modified,
        }
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.name, self.size, self.mime_type, self.last_modified
        )
    }
}

/// Shared set of in-flight fingerprints.
///
/// Cloning yields another handle to the same set. Entries are only ever added
/// through [`InFlightSet::claim`] and removed when the returned guard drops.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<FileIdentity>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<FileIdentity>> {
        self.inner.lock().expect("lock poisoned")
    }

    /// Marks `identity` as in flight, unless it already is.
    pub fn claim(&self, identity: &FileIdentity) -> Option<InFlightGuard> {
        if !self.lock().insert(identity.clone()) {
            return None;
        }
        log::trace!(target: "imgdrop_business::in_flight", "claimed identity={identity}");
        Some(InFlightGuard {
            set: self.clone(),
            identity: identity.clone(),
        })
    }

    pub fn contains(&self, identity: &FileIdentity) -> bool {
        self.lock().contains(identity)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases its fingerprint when dropped.
///
/// Holding the guard across the transport call means success, failure and a
/// cancelled future all end with the fingerprint removed exactly once.
#[derive(Debug)]
#[must_use = "dropping the guard releases the fingerprint immediately"]
pub struct InFlightGuard {
    set: InFlightSet,
    identity: FileIdentity,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.identity);
        log::trace!(
            target: "imgdrop_business::in_flight",
            "released identity={}",
            self.identity
        );
    }
}
