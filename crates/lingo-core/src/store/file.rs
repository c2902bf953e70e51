//! File-backed store, one JSON document per origin.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::PersistentStore;
use crate::error::{Error, Result};

/// Store persisted under a data directory.
///
/// Every origin gets its own file (`<md5(origin)>.json`), so two portals
/// served from different origins never see each other's session.
///
/// There is no cache: every `get` re-reads and re-parses the whole file, so
/// concurrent processes observe each other's writes at the cost of one
/// read per key. Writes go to a temporary file in the same directory that
/// is then renamed over the old one, so readers never see a partial
/// document. A file that does not parse is reported by `get` and replaced
/// by the next `set` or `remove`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    origin: String,
    write_lock: Mutex<()>,
}

type Entries = BTreeMap<String, String>;

impl FileStore {
    /// Open (lazily) the store for `origin` under `dir`.
    pub fn for_origin(dir: impl AsRef<Path>, origin: &str) -> Self {
        let file_name = format!("{:x}.json", md5::compute(origin.as_bytes()));
        Self {
            path: dir.as_ref().join(file_name),
            origin: origin.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Origin this store is scoped to
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!("corrupt store file {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), keys = entries.len(), "Saved store");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Entries) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| Error::LockPoisoned)?;
        let (mut entries, recovered) = match self.load() {
            Ok(entries) => (entries, false),
            Err(Error::Storage(reason)) => {
                warn!(%reason, "Discarding unreadable store file");
                (Entries::new(), true)
            }
            Err(e) => return Err(e),
        };
        if f(&mut entries) || recovered {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
