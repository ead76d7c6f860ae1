//! Redb backend for the farm store.
//!
//! One table, keyed by farm id, holding encoded records. Every write is its
//! own committed transaction, so a crash never leaves a half-merged record.
//!
//! ```yaml
//! index:
//!   backend: "redb"
//!   path: "/var/lib/farmsync/farms.redb"
//! ```

use crate::{IndexBackend, IndexError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

const FARMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("farms");

pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open the database at `path`, creating the file and table if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(IndexError::backend)?;

        let write_txn = db.begin_write().map_err(IndexError::backend)?;
        {
            // Opening inside a write transaction creates the table.
            write_txn
                .open_table(FARMS_TABLE)
                .map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;

        Ok(Self { db })
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(FARMS_TABLE)
                .map_err(IndexError::backend)?;
            table.insert(key, value).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(FARMS_TABLE)
            .map_err(IndexError::backend)?;
        let value = table.get(key).map_err(IndexError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(FARMS_TABLE)
            .map_err(IndexError::backend)?;

        for item in table.iter().map_err(IndexError::backend)? {
            let (_, value) = item.map_err(IndexError::backend)?;
            visitor(value.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn redb_put_overwrites() {
        let file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(file.path()).unwrap();

        backend.put("F1", b"one").unwrap();
        assert_eq!(backend.get("F1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(backend.get("F2").unwrap(), None);

        backend.put("F1", b"uno").unwrap();
        assert_eq!(backend.get("F1").unwrap(), Some(b"uno".to_vec()));
    }

    #[test]
    fn redb_scan_in_key_order() {
        let file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(file.path()).unwrap();
        backend.put("F2", b"two").unwrap();
        backend.put("F1", b"one").unwrap();

        let mut seen = Vec::new();
        backend
            .scan(&mut |value| {
                seen.push(value.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn redb_reopen_keeps_data() {
        let file = NamedTempFile::new().unwrap();
        {
            let backend = RedbBackend::open(file.path()).unwrap();
            backend.put("F1", b"persisted").unwrap();
        }
        let reopened = RedbBackend::open(file.path()).unwrap();
        assert_eq!(reopened.get("F1").unwrap(), Some(b"persisted".to_vec()));
    }
}
