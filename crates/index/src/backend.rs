use crate::IndexError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Key-value storage underneath [`FarmIndex`](crate::FarmIndex).
///
/// Keys are farm ids; values are encoded records. Implementations must be
/// safe to share across threads.
pub trait IndexBackend: Send + Sync {
    /// Insert or replace the value stored under `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Visit every stored value in key order.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError>;
    /// Flush any buffered writes.
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Selects and builds a backend.
///
/// ```
/// use index::BackendConfig;
///
/// let ephemeral = BackendConfig::in_memory();
/// let on_disk = BackendConfig::redb("/var/lib/farmsync/farms.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Redb file at `path`. Requires the `backend-redb` feature (on by
    /// default).
    Redb { path: String },
    /// Process-local map; contents are lost on exit.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Redb { .. } => "redb",
            BackendConfig::InMemory => "in_memory",
        }
    }

    /// Build the configured backend.
    ///
    /// Fails when the redb file cannot be opened, or when redb is requested
    /// but the feature was compiled out.
    pub fn build(&self) -> Result<Box<dyn IndexBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// In-memory backend: a `BTreeMap` behind a `RwLock`, so scans come out in
/// key order like the on-disk backend.
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        for value in guard.values() {
            visitor(value)?;
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_scan_is_key_ordered() {
        let backend = InMemoryBackend::new();
        backend.put("F3", b"three").unwrap();
        backend.put("F1", b"one").unwrap();
        backend.put("F2", b"two").unwrap();

        let mut seen = Vec::new();
        backend
            .scan(&mut |value| {
                seen.push(value.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn in_memory_overwrite_replaces_value() {
        let backend = InMemoryBackend::new();
        backend.put("F1", b"a").unwrap();
        backend.put("F1", b"b").unwrap();
        assert_eq!(backend.get("F1").unwrap(), Some(b"b".to_vec()));
        assert_eq!(backend.get("F2").unwrap(), None);
    }

    #[test]
    fn build_in_memory() {
        let backend = BackendConfig::in_memory().build().expect("in-memory backend");
        assert_eq!(backend.get("missing").unwrap(), None);
        assert_eq!(BackendConfig::default().name(), "in_memory");
    }
}
