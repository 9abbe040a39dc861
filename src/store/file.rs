//! JSON file store.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::store::{RouteStore, RouterSnapshot, StoreError};

/// Keeps the router snapshot in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open an existing cache file, or create an empty one.
    ///
    /// An existing file must be readable and writable. A missing file is
    /// created in place; its directory is not created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if path.is_file() {
            File::open(&path).map_err(|source| StoreError::NotReadable {
                path: path.clone(),
                source,
            })?;
            OpenOptions::new()
                .append(true)
                .open(&path)
                .map_err(|source| StoreError::NotWritable {
                    path: path.clone(),
                    source,
                })?;
        } else if path.exists() {
            return Err(StoreError::NotCreatable {
                source: std::io::Error::other("path exists and is not a regular file"),
                path,
            });
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|source| StoreError::NotCreatable {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(path = ?path, "Created router cache file");
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the cache file aside to `<name>.corrupt` and return the new path.
    pub fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".corrupt");
        let target = self.path.with_file_name(name);

        fs::rename(&self.path, &target).map_err(|source| StoreError::NotWritable {
            path: self.path.clone(),
            source,
        })?;
        Ok(target)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl RouteStore for FileStore {
    fn load(&mut self) -> Result<Option<RouterSnapshot>, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::NotReadable {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: RouterSnapshot =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tracing::info!(
            path = ?self.path,
            bindings = snapshot.bindings.len(),
            memoized = snapshot.routes.len() + snapshot.aliases.len(),
            "Loaded router cache file"
        );
        Ok(Some(snapshot))
    }

    /// Write to a sibling temp file, then rename it over the cache file, so
    /// a failed write leaves the previous contents intact.
    fn save(&mut self, snapshot: &RouterSnapshot) -> Result<(), StoreError> {
        let not_writable = |source| StoreError::NotWritable {
            path: self.path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(self.dir()).map_err(not_writable)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, snapshot).map_err(std::io::Error::from)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| not_writable(e.error))?;

        tracing::debug!(
            path = ?self.path,
            bindings = snapshot.bindings.len(),
            "Saved router cache file"
        );
        Ok(())
    }
}
