//! A directory of markdown notes, seen as a vault.
//!
//! Notes the CLI is working on are opened into a [`StringBuffer`]; reads and
//! writes of an open note go through its buffer, the way an editor host keeps
//! an open file and its view in sync. [`FsVault::save_open_notes`] writes them
//! back to disk.
//!
//! The file list and the text of every note are read once when the vault is
//! opened; link resolution and reference lookups run against that index.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::UNIX_EPOCH;

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use imgdrop_business::{
    FileStat, Reference, ReferenceIndex, StringBuffer, Vault, VaultError, VaultFiles, is_note,
    references_in_document,
};
use tracing::debug;

/// Files of the vault and the on-disk text of its notes.
struct Index {
    files: VaultFiles,
    notes: BTreeMap<String, String>,
}

impl Index {
    fn scan(root: &Path) -> Self {
        let files = walk(root);
        let notes = files
            .iter()
            .filter(|path| is_note(path))
            .filter_map(|path| {
                let text = fs::read_to_string(root.join(path)).ok()?;
                Some((path.clone(), text))
            })
            .collect();
        Self {
            files: VaultFiles::new(files.iter().map(String::as_str)),
            notes,
        }
    }
}

pub struct FsVault {
    root: PathBuf,
    open: Mutex<HashMap<String, Arc<StringBuffer>>>,
    index: RwLock<Index>,
}

impl FsVault {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("Vault directory not found: {}", root.display()))?;
        if !root.is_dir() {
            bail!("Vault is not a directory: {}", root.display());
        }
        let index = Index::scan(&root);
        debug!(files = index.files.len(), notes = index.notes.len(), "vault indexed");
        Ok(Self {
            root,
            open: Mutex::new(HashMap::new()),
            index: RwLock::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open_notes(&self) -> MutexGuard<'_, HashMap<String, Arc<StringBuffer>>> {
        self.open.lock().expect("lock poisoned")
    }

    fn open_buffer(&self, path: &str) -> Option<Arc<StringBuffer>> {
        self.open_notes().get(path).cloned()
    }

    fn cache_note(&self, path: &str, text: &str) {
        let mut index = self.index.write().expect("lock poisoned");
        index.files.insert(path);
        index.notes.insert(path.to_owned(), text.to_owned());
    }

    /// Absolute path of a vault path.
    pub fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Vault path of a file given relative to the working directory or absolute.
    pub fn vault_path(&self, path: &Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to read the working directory")?
                .join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        let relative = absolute
            .strip_prefix(&self.root)
            .with_context(|| format!("{} is outside the vault", path.display()))?;
        Ok(to_vault_path(relative))
    }

    /// Opens a note into a buffer, with the cursor at the start.
    pub fn open_note(&self, path: &str) -> Result<Arc<StringBuffer>> {
        if let Some(buffer) = self.open_buffer(path) {
            return Ok(buffer);
        }

        let text = fs::read_to_string(self.absolute(path))
            .with_context(|| format!("Failed to read note: {path}"))?;
        self.cache_note(path, &text);
        let buffer = Arc::new(StringBuffer::new(text));
        self.open_notes().insert(path.to_owned(), buffer.clone());
        Ok(buffer)
    }

    /// Writes every open note back to disk.
    pub fn save_open_notes(&self) -> Result<()> {
        let open: Vec<(String, Arc<StringBuffer>)> = self
            .open_notes()
            .iter()
            .map(|(path, buffer)| (path.clone(), buffer.clone()))
            .collect();

        for (path, buffer) in open {
            fs::write(self.absolute(&path), buffer.text())
                .with_context(|| format!("Failed to write note: {path}"))?;
            debug!(note = %path, "note saved");
        }
        Ok(())
    }

    /// Every file in the vault, hidden directories excluded.
    pub fn files(&self) -> Vec<String> {
        self.index.read().expect("lock poisoned").files.sorted()
    }

    /// Picks a vault path for a new attachment named `name` at the vault root.
    pub fn available_attachment_path(&self, name: &str) -> String {
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .map_or_else(|| name.to_owned(), |s| s.to_string_lossy().into_owned());
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let index = self.index.read().expect("lock poisoned");
        let mut candidate = name.to_owned();
        let mut counter = 1;
        while index.files.contains(&candidate) || self.absolute(&candidate).exists() {
            candidate = format!("{stem} {counter}{extension}");
            counter += 1;
        }
        candidate
    }

    /// Writes `bytes` as a new attachment named after `name` and returns its vault path.
    pub fn add_attachment(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.available_attachment_path(name);
        fs::write(self.absolute(&path), bytes)
            .with_context(|| format!("Failed to save {path}"))?;
        self.index.write().expect("lock poisoned").files.insert(&path);
        Ok(path)
    }
}

fn walk(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(root) {
                files.push(to_vault_path(relative));
            }
        }
    }
    files
}

fn to_vault_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn not_found_or(path: &str, err: &std::io::Error, read: bool) -> VaultError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return VaultError::NotFound(path.to_owned());
    }
    let message = err.to_string();
    if read {
        VaultError::Read {
            path: path.to_owned(),
            message,
        }
    } else {
        VaultError::Write {
            path: path.to_owned(),
            message,
        }
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        if let Some(buffer) = self.open_buffer(path) {
            return Ok(buffer.text());
        }
        tokio::fs::read_to_string(self.absolute(path))
            .await
            .map_err(|e| not_found_or(path, &e, true))
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), VaultError> {
        if let Some(buffer) = self.open_buffer(path) {
            buffer.set_text(content);
            return Ok(());
        }
        let absolute = self.absolute(path);
        if !absolute.is_file() {
            return Err(VaultError::NotFound(path.to_owned()));
        }
        tokio::fs::write(absolute, content)
            .await
            .map_err(|e| not_found_or(path, &e, false))?;
        if is_note(path) {
            self.cache_note(path, content);
        }
        Ok(())
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        tokio::fs::read(self.absolute(path))
            .await
            .map_err(|e| not_found_or(path, &e, true))
    }

    async fn stat(&self, path: &str) -> Result<FileStat, VaultError> {
        let metadata = tokio::fs::metadata(self.absolute(path))
            .await
            .map_err(|e| not_found_or(path, &e, true))?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        Ok(FileStat {
            size: metadata.len(),
            mtime,
        })
    }

    fn resolve_link(&self, link: &str, from: &str) -> Option<String> {
        self.index.read().expect("lock poisoned").files.resolve(link, from)
    }
}

impl ReferenceIndex for FsVault {
    fn references_to(&self, resource: &str) -> Vec<Reference> {
        let index = self.index.read().expect("lock poisoned");
        let resolve = |link: &str, from: &str| index.files.resolve(link, from);

        index
            .notes
            .iter()
            .flat_map(|(path, saved)| match self.open_buffer(path) {
                Some(buffer) => references_in_document(path, &buffer.text(), resource, resolve),
                None => references_in_document(path, saved, resource, resolve),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgdrop_business::{Position, TextBuffer as _};

    fn vault_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("assets")).expect("Should create dir");
        fs::create_dir_all(root.join(".obsidian")).expect("Should create dir");
        fs::write(root.join("assets/cat.png"), [1, 2, 3]).expect("Should write");
        fs::write(root.join("day.md"), "![[cat.png]]\n").expect("Should write");
        fs::write(root.join("assets/other.md"), "see ![x](cat.png)").expect("Should write");
        fs::write(root.join(".obsidian/workspace.md"), "![[cat.png]]").expect("Should write");
        dir
    }

    #[test]
    fn test_files_skip_hidden_directories() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");
        assert_eq!(
            vault.files(),
            vec!["assets/cat.png", "assets/other.md", "day.md"]
        );
    }

    #[test]
    fn test_resolve_link() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");
        assert_eq!(
            vault.resolve_link("cat.png", "day.md").as_deref(),
            Some("assets/cat.png")
        );
        assert_eq!(vault.resolve_link("dog.png", "day.md"), None);
    }

    #[test]
    fn test_references_across_notes() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");

        let refs = vault.references_to("assets/cat.png");
        let docs: Vec<&str> = refs.iter().map(|r| r.document_path.as_str()).collect();
        assert_eq!(docs, vec!["assets/other.md", "day.md"]);
        assert_eq!(refs[0].start, Position::new(0, 4));
    }

    #[tokio::test]
    async fn test_index_follows_changes_made_through_the_vault() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");

        let path = vault.add_attachment("dog.png", &[4]).expect("Should attach");
        assert_eq!(path, "dog.png");
        assert_eq!(vault.resolve_link("dog.png", "day.md").as_deref(), Some("dog.png"));

        vault
            .modify("assets/other.md", "![[dog.png]]")
            .await
            .expect("Should modify");
        let refs = vault.references_to("dog.png");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document_path, "assets/other.md");
        let cat = vault.references_to("assets/cat.png");
        assert!(cat.iter().all(|r| r.document_path == "day.md"));
    }

    #[test]
    fn test_references_see_open_buffers() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");
        let buffer = vault.open_note("day.md").expect("Should open");

        buffer.set_text("nothing here");
        let refs = vault.references_to("assets/cat.png");
        let docs: Vec<&str> = refs.iter().map(|r| r.document_path.as_str()).collect();
        assert_eq!(docs, vec!["assets/other.md"]);
    }

    #[tokio::test]
    async fn test_open_note_routes_reads_and_writes() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");
        let buffer = vault.open_note("day.md").expect("Should open");

        buffer.replace_selection("intro\n");
        assert_eq!(vault.read("day.md").await.expect("Should read"), "intro\n![[cat.png]]\n");

        vault.modify("day.md", "rewritten").await.expect("Should modify");
        assert_eq!(buffer.text(), "rewritten");
        assert_eq!(
            fs::read_to_string(dir.path().join("day.md")).expect("Should read"),
            "![[cat.png]]\n"
        );

        vault.save_open_notes().expect("Should save");
        assert_eq!(
            fs::read_to_string(dir.path().join("day.md")).expect("Should read"),
            "rewritten"
        );
    }

    #[tokio::test]
    async fn test_modify_closed_note_writes_disk() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");

        vault
            .modify("assets/other.md", "changed")
            .await
            .expect("Should modify");
        assert_eq!(
            fs::read_to_string(dir.path().join("assets/other.md")).expect("Should read"),
            "changed"
        );
        assert_eq!(
            vault.modify("missing.md", "x").await,
            Err(VaultError::NotFound("missing.md".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_binary_and_stat() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");

        assert_eq!(
            vault.read_binary("assets/cat.png").await.expect("Should read"),
            vec![1, 2, 3]
        );
        let stat = vault.stat("assets/cat.png").await.expect("Should stat");
        assert_eq!(stat.size, 3);
        assert!(stat.mtime > 0);
    }

    #[test]
    fn test_vault_path() {
        let dir = vault_dir();
        let vault = FsVault::new(dir.path()).expect("Should open vault");
        assert_eq!(
            vault
                .vault_path(&dir.path().join("assets/other.md"))
                .expect("Should map"),
            "assets/other.md"
        );
        assert!(vault.vault_path(Path::new("/definitely/elsewhere.md")).is_err());
    }

    #[test]
    fn test_available_attachment_path() {
        let dir = vault_dir();
        fs::write(dir.path().join("shot.png"), [0]).expect("Should write");
        fs::write(dir.path().join("shot 1.png"), [0]).expect("Should write");
        let vault = FsVault::new(dir.path()).expect("Should open vault");

        assert_eq!(vault.available_attachment_path("new.png"), "new.png");
        assert_eq!(vault.available_attachment_path("shot.png"), "shot 2.png");
    }
}
