/// `redb`-backed preference file
use std::path::{Path, PathBuf};

use redb::{Database, TableDefinition};

use crate::error::{Result, StorageError};
use crate::kv::KeyValueStore;

const PREFERENCES: TableDefinition<&str, &str> = TableDefinition::new("preferences");

/// Durable key/value store in a single `redb` file
///
/// Each write is its own committed transaction, so a value is on disk as
/// soon as `set` returns.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Open the database at `path`, creating it (and parent directories) if missing
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the file is not
    /// a valid database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(backend)?;
        tracing::debug!(path = %path.display(), "Opened preference store");

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn backend(err: impl Into<redb::Error>) -> StorageError {
    StorageError::from(err.into())
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read = self.db.begin_read().map_err(backend)?;
        let table = match read.open_table(PREFERENCES) {
            Ok(table) => table,
            // Nothing has been written yet
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(backend(e)),
        };

        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write.open_table(PREFERENCES).map_err(backend)?;
            table.insert(key, value).map_err(backend)?;
        }
        write.commit().map_err(backend)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write.open_table(PREFERENCES).map_err(backend)?;
            table.remove(key).map_err(backend)?;
        }
        write.commit().map_err(backend)?;
        Ok(())
    }
}
