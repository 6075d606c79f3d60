// chain-core/src/store.rs

use crate::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Key-value state store the modules run against.
///
/// All block processing is single-threaded, so the trait takes `&mut self`
/// for writes and relies on the surrounding ledger commit for atomicity.
/// `prefix_scan` must return entries in ascending key order; selection and
/// iteration determinism depend on it.
pub trait StateStore {
    fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>>;

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> CoreResult<()>;

    fn delete(&mut self, key: &[u8]) -> CoreResult<()>;

    fn has(&self, key: &[u8]) -> CoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, in ascending key order
    fn prefix_scan(&self, prefix: &[u8]) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// In-memory store backed by a sorted map.
///
/// The canonical backend for unit tests and simulation; the storage crate
/// provides the persistent RocksDB implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> CoreResult<()> {
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Read a bincode-encoded value from the store
pub fn get_typed<S: StateStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &[u8],
) -> CoreResult<Option<T>> {
    match store.get(key)? {
        Some(bytes) => {
            let value = bincode::deserialize(&bytes)
                .map_err(|e| CoreError::Encoding(e.to_string()))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Write a bincode-encoded value to the store
pub fn set_typed<S: StateStore + ?Sized, T: Serialize>(
    store: &mut S,
    key: &[u8],
    value: &T,
) -> CoreResult<()> {
    let bytes = bincode::serialize(value).map_err(|e| CoreError::Encoding(e.to_string()))?;
    store.set(key, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let mut store = MemoryStore::new();
        store.set(b"key", b"value".to_vec()).unwrap();

        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
        assert!(store.has(b"key").unwrap());

        store.delete(b"key").unwrap();
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn test_prefix_scan_sorted() {
        let mut store = MemoryStore::new();
        store.set(b"Validator|c", vec![3]).unwrap();
        store.set(b"Validator|a", vec![1]).unwrap();
        store.set(b"Validator|b", vec![2]).unwrap();
        store.set(b"Weight|a", vec![9]).unwrap();

        let entries = store.prefix_scan(b"Validator|").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, b"Validator|a".to_vec());
        assert_eq!(entries[1].0, b"Validator|b".to_vec());
        assert_eq!(entries[2].0, b"Validator|c".to_vec());
    }

    #[test]
    fn test_typed_round_trip() {
        let mut store = MemoryStore::new();
        let value = vec!["a".to_string(), "b".to_string()];
        set_typed(&mut store, b"list", &value).unwrap();

        let loaded: Vec<String> = get_typed(&store, b"list").unwrap().unwrap();
        assert_eq!(loaded, value);

        let missing: Option<Vec<String>> = get_typed(&store, b"absent").unwrap();
        assert!(missing.is_none());
    }
}
