//! `FileStore` implementations: a directory on disk and an in-memory map.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::debug;

use agira_contracts::error::{AgiraError, AgiraResult};
use agira_core::traits::FileStore;

/// File names become a single path component under the store's root.
fn check_name(name: &str) -> AgiraResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(AgiraError::StorageFailed {
            reason: format!("invalid report file name '{}'", name),
        });
    }
    Ok(())
}

/// Upper bound on `_<n>` suffixes tried before giving up on a name.
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// `name` itself for attempt 0, then `stem_1.ext`, `stem_2.ext`, ...
fn candidate(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, attempt, ext),
        _ => format!("{}_{}", name, attempt),
    }
}

fn names_exhausted(name: &str) -> AgiraError {
    AgiraError::StorageFailed {
        reason: format!("no free file name derived from '{}'", name),
    }
}

// ── Filesystem ────────────────────────────────────────────────────────────────

/// Stores report files flat inside one directory.
///
/// The directory is created on first save. Files are created exclusively, so
/// an existing file is never replaced; a taken name gets a `_<n>` suffix.
/// `save` returns the full path of the written file, which is what `open`
/// expects back.
#[derive(Debug, Clone)]
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStore for FsFileStore {
    fn save(&self, name: &str, bytes: &[u8]) -> AgiraResult<String> {
        check_name(name)?;

        fs::create_dir_all(&self.root).map_err(|e| AgiraError::StorageFailed {
            reason: format!("cannot create '{}': {}", self.root.display(), e),
        })?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.root.join(candidate(name, attempt));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AgiraError::StorageFailed {
                        reason: format!("cannot create '{}': {}", path.display(), e),
                    })
                }
            };
            file.write_all(bytes).map_err(|e| AgiraError::StorageFailed {
                reason: format!("cannot write '{}': {}", path.display(), e),
            })?;

            debug!(path = %path.display(), size_bytes = bytes.len(), "report file written");
            return Ok(path.display().to_string());
        }
        Err(names_exhausted(name))
    }

    fn open(&self, path: &str) -> AgiraResult<Vec<u8>> {
        fs::read(path).map_err(|e| AgiraError::StorageFailed {
            reason: format!("cannot read '{}': {}", path, e),
        })
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Keeps report files in a map keyed by name. Clones share the same map.
/// Taken names get a `_<n>` suffix, as on disk.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all stored files, sorted.
    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl FileStore for InMemoryFileStore {
    fn save(&self, name: &str, bytes: &[u8]) -> AgiraResult<String> {
        check_name(name)?;
        let mut files = self.files.lock().map_err(|e| AgiraError::StorageFailed {
            reason: format!("file store lock poisoned: {}", e),
        })?;
        let free = (0..MAX_NAME_ATTEMPTS)
            .map(|attempt| candidate(name, attempt))
            .find(|free| !files.contains_key(free))
            .ok_or_else(|| names_exhausted(name))?;
        files.insert(free.clone(), bytes.to_vec());
        Ok(free)
    }

    fn open(&self, path: &str) -> AgiraResult<Vec<u8>> {
        let files = self.files.lock().map_err(|e| AgiraError::StorageFailed {
            reason: format!("file store lock poisoned: {}", e),
        })?;
        files.get(path).cloned().ok_or_else(|| AgiraError::StorageFailed {
            reason: format!("no stored file '{}'", path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFileStore::new(dir.path().join("media").join("reports"));

        let path = store.save("change.v1_change_1_20240101_000000.pdf", b"%PDF-1.4").unwrap();

        assert!(Path::new(&path).starts_with(store.root()));
        assert_eq!(store.open(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn fs_store_never_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFileStore::new(dir.path());

        let first = store.save("a.pdf", b"one").unwrap();
        let second = store.save("a.pdf", b"two").unwrap();
        let third = store.save("a.pdf", b"three").unwrap();

        assert!(first.ends_with("a.pdf"));
        assert!(second.ends_with("a_1.pdf"));
        assert!(third.ends_with("a_2.pdf"));
        assert_eq!(store.open(&first).unwrap(), b"one");
        assert_eq!(store.open(&second).unwrap(), b"two");
        assert_eq!(store.open(&third).unwrap(), b"three");
    }

    #[test]
    fn candidate_names_keep_the_extension() {
        assert_eq!(candidate("r.pdf", 0), "r.pdf");
        assert_eq!(candidate("change.v1_change_1_20240101_120000.pdf", 2), "change.v1_change_1_20240101_120000_2.pdf");
        assert_eq!(candidate("noext", 1), "noext_1");
        assert_eq!(candidate(".hidden", 1), ".hidden_1");
    }

    #[test]
    fn path_components_in_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFileStore::new(dir.path());

        for name in ["../escape.pdf", "nested/a.pdf", "..", ""] {
            assert!(
                matches!(store.save(name, b"x"), Err(AgiraError::StorageFailed { .. })),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn fs_store_open_missing_is_storage_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFileStore::new(dir.path());
        let missing = dir.path().join("missing.pdf");
        assert!(matches!(
            store.open(&missing.display().to_string()),
            Err(AgiraError::StorageFailed { .. })
        ));
    }

    #[test]
    fn memory_store_clones_share_contents() {
        let store = InMemoryFileStore::new();
        let clone = store.clone();

        let path = store.save("b.pdf", b"bytes").unwrap();
        assert_eq!(clone.open(&path).unwrap(), b"bytes");
        assert_eq!(clone.names(), vec!["b.pdf"]);
        assert!(clone.open("other.pdf").is_err());
    }

    #[test]
    fn memory_store_never_replaces_existing_file() {
        let store = InMemoryFileStore::new();

        let first = store.save("b.pdf", b"one").unwrap();
        let second = store.save("b.pdf", b"two").unwrap();

        assert_eq!(second, "b_1.pdf");
        assert_eq!(store.open(&first).unwrap(), b"one");
        assert_eq!(store.open(&second).unwrap(), b"two");
    }
}
