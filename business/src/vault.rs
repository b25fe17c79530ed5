//! Note storage the rewriter and the local-upload command work against.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::references::{Reference, ReferenceIndex, references_in_document};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub mtime: i64,
}

/// Access to the documents and attachments of a vault.
///
/// Paths are vault-relative with `/` separators.
#[async_trait]
pub trait Vault: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, VaultError>;

    async fn modify(&self, path: &str, content: &str) -> Result<(), VaultError>;

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError>;

    async fn stat(&self, path: &str) -> Result<FileStat, VaultError>;

    /// Vault path a link written in `from` points to, if that file exists.
    fn resolve_link(&self, link: &str, from: &str) -> Option<String>;
}

/// Parent folder of a vault path, empty at the root.
pub fn parent_folder(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Joins `link` onto `folder`, folding `.` and `..` segments.
fn join_vault_path(folder: &str, link: &str) -> String {
    let mut segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
    for segment in link.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// The vault's file paths, indexed for link resolution.
#[derive(Debug, Clone, Default)]
pub struct VaultFiles {
    paths: HashSet<String>,
    /// File name to paths, shortest path first.
    by_name: HashMap<String, Vec<String>>,
}

impl VaultFiles {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for path in files {
            index.insert(path);
        }
        index
    }

    pub fn insert(&mut self, path: &str) {
        if !self.paths.insert(path.to_owned()) {
            return;
        }
        let name = path.rsplit('/').next().unwrap_or(path);
        let paths = self.by_name.entry(name.to_owned()).or_default();
        paths.push(path.to_owned());
        paths.sort_by(|a, b| (a.len(), a).cmp(&(b.len(), b)));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Every path, sorted.
    pub fn sorted(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.paths.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Resolves `link` written in the note `from`.
    ///
    /// Tries the path relative to the linking note, then from the vault root,
    /// then the shortest file path whose name matches.
    pub fn resolve(&self, link: &str, from: &str) -> Option<String> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }

        let relative = join_vault_path(parent_folder(from), link);
        let absolute = join_vault_path("", link);
        for candidate in [relative, absolute] {
            if self.contains(&candidate) {
                return Some(candidate);
            }
        }

        let name = Path::new(link).file_name()?.to_str()?;
        self.by_name.get(name)?.first().cloned()
    }
}

/// Resolves a link among `files`. See [`VaultFiles::resolve`].
pub fn resolve_among<'a, I>(files: I, link: &str, from: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    VaultFiles::new(files).resolve(link, from)
}

/// Whether `path` names a markdown note.
pub fn is_note(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// In-memory [`Vault`] and [`ReferenceIndex`].
#[derive(Debug, Default)]
pub struct MemoryVault {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, MemoryFile>,
    failing_writes: HashSet<String>,
    writes: Vec<String>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    mtime: i64,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("lock poisoned")
    }

    pub fn insert_note(&self, path: &str, text: &str) {
        self.insert_file(path, text.as_bytes().to_vec(), 0);
    }

    pub fn insert_file(&self, path: &str, bytes: Vec<u8>, mtime: i64) {
        self.state()
            .files
            .insert(path.to_owned(), MemoryFile { bytes, mtime });
    }

    /// Makes every later write to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        self.state().failing_writes.insert(path.to_owned());
    }

    pub fn note(&self, path: &str) -> Option<String> {
        self.state()
            .files
            .get(path)
            .map(|file| String::from_utf8_lossy(&file.bytes).into_owned())
    }

    /// Paths written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        self.note(path)
            .ok_or_else(|| VaultError::NotFound(path.to_owned()))
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let mut state = self.state();
        if state.failing_writes.contains(path) {
            return Err(VaultError::Write {
                path: path.to_owned(),
                message: "write refused".to_owned(),
            });
        }
        let file = state
            .files
            .get_mut(path)
            .ok_or_else(|| VaultError::NotFound(path.to_owned()))?;
        file.bytes = content.as_bytes().to_vec();
        state.writes.push(path.to_owned());
        Ok(())
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        self.state()
            .files
            .get(path)
            .map(|file| file.bytes.clone())
            .ok_or_else(|| VaultError::NotFound(path.to_owned()))
    }

    async fn stat(&self, path: &str) -> Result<FileStat, VaultError> {
        self.state()
            .files
            .get(path)
            .map(|file| FileStat {
                size: file.bytes.len() as u64,
                mtime: file.mtime,
            })
            .ok_or_else(|| VaultError::NotFound(path.to_owned()))
    }

    fn resolve_link(&self, link: &str, from: &str) -> Option<String> {
        let state = self.state();
        resolve_among(state.files.keys().map(String::as_str), link, from)
    }
}

impl ReferenceIndex for MemoryVault {
    fn references_to(&self, resource: &str) -> Vec<Reference> {
        let (files, notes): (VaultFiles, Vec<(String, String)>) = {
            let state = self.state();
            let files = VaultFiles::new(state.files.keys().map(String::as_str));
            let notes = state
                .files
                .iter()
                .filter(|(path, _)| is_note(path))
                .map(|(path, file)| {
                    let text = String::from_utf8_lossy(&file.bytes).into_owned();
                    (path.clone(), text)
                })
                .collect();
            (files, notes)
        };

        notes
            .iter()
            .flat_map(|(path, text)| {
                references_in_document(path, text, resource, |link, from| {
                    files.resolve(link, from)
                })
            })
            .collect()
    }
}
