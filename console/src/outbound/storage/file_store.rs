//! File-backed key-value store for persisting the credential between CLI runs.
//!
//! All slots live in one JSON object on disk. Writes go to a sibling temp file
//! that is then renamed over the original, so readers never observe a torn
//! file.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cap_std::fs::{Dir, OpenOptions};
use cap_std::ambient_authority;
use tracing::{debug, warn};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

type Slots = BTreeMap<String, String>;

/// Key-value store persisted as a JSON object in a single file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: Dir,
    file_name: PathBuf,
    temp_name: PathBuf,
    display_path: PathBuf,
    guard: Mutex<()>,
}

impl FileKeyValueStore {
    /// Open (creating parent directories as needed) the store at `path`.
    ///
    /// The file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Write`] when the parent directory cannot
    /// be created or opened.
    pub fn open(path: &Path) -> Result<Self, KeyValueStoreError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path.file_name().ok_or_else(|| {
            KeyValueStoreError::write(format!("{} does not name a file", path.display()))
        })?;

        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|error| io_error(KeyValueStoreError::write, parent, &error))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|error| io_error(KeyValueStoreError::write, parent, &error))?;
        Ok(Self::in_dir(dir, Path::new(file_name), path.to_path_buf()))
    }

    /// Store backed by `file_name` inside an already opened directory.
    pub fn in_dir(dir: Dir, file_name: &Path, display_path: PathBuf) -> Self {
        let mut temp = OsString::from(".");
        temp.push(file_name.as_os_str());
        temp.push(".tmp");
        Self {
            dir,
            file_name: file_name.to_path_buf(),
            temp_name: PathBuf::from(temp),
            display_path,
            guard: Mutex::new(()),
        }
    }

    /// Path reported in errors and logs.
    pub fn path(&self) -> &Path {
        &self.display_path
    }

    fn read_contents(&self) -> Result<Option<String>, KeyValueStoreError> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(KeyValueStoreError::read, &self.display_path, &error)),
        }
    }

    fn decode(&self, contents: &str) -> Result<Slots, KeyValueStoreError> {
        serde_json::from_str(contents).map_err(|error| {
            KeyValueStoreError::read(format!(
                "{} is not a JSON object of strings: {error}",
                self.display_path.display()
            ))
        })
    }

    fn load(&self) -> Result<Slots, KeyValueStoreError> {
        match self.read_contents()? {
            Some(contents) => self.decode(&contents),
            None => Ok(Slots::new()),
        }
    }

    /// Like [`Self::load`], but an undecodable file counts as empty so the
    /// next write replaces it.
    fn load_for_update(&self) -> Result<Slots, KeyValueStoreError> {
        let Some(contents) = self.read_contents()? else {
            return Ok(Slots::new());
        };
        Ok(self.decode(&contents).unwrap_or_else(|error| {
            warn!(error = %error, "discarding unreadable key-value store");
            Slots::new()
        }))
    }

    fn persist(&self, slots: &Slots) -> Result<(), KeyValueStoreError> {
        if slots.is_empty() {
            return match self.dir.remove_file(&self.file_name) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(io_error(KeyValueStoreError::write, &self.display_path, &error)),
            };
        }

        let encoded = serde_json::to_vec_pretty(slots)
            .map_err(|error| KeyValueStoreError::write(error.to_string()))?;
        self.write_temp(&encoded)
            .map_err(|error| io_error(KeyValueStoreError::write, &self.display_path, &error))?;
        self.dir
            .rename(&self.temp_name, &self.dir, &self.file_name)
            .map_err(|error| io_error(KeyValueStoreError::write, &self.display_path, &error))?;
        debug!(path = %self.display_path.display(), slots = slots.len(), "key-value store saved");
        Ok(())
    }

    fn write_temp(&self, bytes: &[u8]) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use cap_std::fs::OpenOptionsExt as _;
            options.mode(0o600);
        }
        let mut file = self.dir.open_with(&self.temp_name, &options)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn update(&self, change: impl FnOnce(&mut Slots)) -> Result<(), KeyValueStoreError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.load_for_update()?;
        change(&mut slots);
        self.persist(&slots)
    }
}

fn io_error(
    make: fn(String) -> KeyValueStoreError,
    path: &Path,
    error: &io::Error,
) -> KeyValueStoreError {
    make(format!("{}: {error}", path.display()))
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.update(|slots| {
            slots.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.update(|slots| {
            slots.remove(key);
        })
    }
}
