//! The persisted double-reset flag
//!
//! A single byte under a fixed namespace/key. `0` or absent means clear, any
//! other value means set. Both setters read first so repeated calls never wear
//! the flash with redundant writes.

use core::fmt::Debug;

use crate::error::DoubleResetError;

/// Maximum length of a namespace or key name, matching the ESP-IDF NVS limit
pub const MAX_NAME_LEN: usize = 15;

/// Location of a value in a namespaced key-value store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagKey {
    pub namespace: &'static str,
    pub key: &'static str,
}

/// Where the detector keeps its flag
pub const FLAG_KEY: FlagKey = FlagKey::new("double_reset", "state");

impl FlagKey {
    /// Create a key, rejecting names longer than [`MAX_NAME_LEN`] at compile time
    /// when used in a `const`.
    pub const fn new(namespace: &'static str, key: &'static str) -> Self {
        assert!(namespace.len() <= MAX_NAME_LEN, "namespace name too long");
        assert!(key.len() <= MAX_NAME_LEN, "key name too long");
        Self { namespace, key }
    }

    /// Pack namespace and key into a fixed-size record key.
    ///
    /// Layout: namespace bytes zero-padded to 16, then key bytes zero-padded to 16.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..self.namespace.len()].copy_from_slice(self.namespace.as_bytes());
        out[16..16 + self.key.len()].copy_from_slice(self.key.as_bytes());
        out
    }
}

/// Durable one-byte key-value storage, already initialized by the application.
///
/// Methods take `&self` so the boot procedure and the clear task can share one
/// backend; implementations serialize access internally.
pub trait FlagStorage {
    type Error: Debug;

    /// Read the byte stored under `key`, `Ok(None)` when nothing was stored.
    fn load(&self, key: &FlagKey) -> impl Future<Output = Result<Option<u8>, Self::Error>>;

    /// Store `value` under `key` and commit it durably before returning.
    fn store(&self, key: &FlagKey, value: u8) -> impl Future<Output = Result<(), Self::Error>>;

    /// Remove the value under `key` and commit. Removing a missing key is not an error.
    fn erase(&self, key: &FlagKey) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Typed accessors for the flag on top of a [`FlagStorage`]
pub struct PersistedFlag<'s, S: FlagStorage> {
    storage: &'s S,
    key: FlagKey,
}

impl<'s, S: FlagStorage> PersistedFlag<'s, S> {
    pub const fn new(storage: &'s S) -> Self {
        Self::with_key(storage, FLAG_KEY)
    }

    pub const fn with_key(storage: &'s S, key: FlagKey) -> Self {
        Self { storage, key }
    }

    /// Current value of the flag. A missing value reads as `false`.
    pub async fn get(&self) -> Result<bool, DoubleResetError<S::Error>> {
        let raw = self
            .storage
            .load(&self.key)
            .await
            .map_err(DoubleResetError::StorageUnavailable)?;
        Ok(raw.is_some_and(|value| value != 0))
    }

    /// Set the flag. No write happens when it is already set.
    pub async fn set(&self) -> Result<(), DoubleResetError<S::Error>> {
        if self.get().await? {
            return Ok(());
        }
        self.storage
            .store(&self.key, 1)
            .await
            .map_err(DoubleResetError::StorageWrite)
    }

    /// Clear the flag. No write happens when it is already clear.
    pub async fn clear(&self) -> Result<(), DoubleResetError<S::Error>> {
        if !self.get().await? {
            return Ok(());
        }
        self.storage
            .erase(&self.key)
            .await
            .map_err(DoubleResetError::StorageWrite)
    }

    /// Set or clear depending on `state`
    pub async fn write(&self, state: bool) -> Result<(), DoubleResetError<S::Error>> {
        if state { self.set().await } else { self.clear().await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::{Fault, MemoryStorage};
    use embassy_futures::block_on;

    #[test]
    fn test_key_packing() {
        let bytes = FLAG_KEY.to_bytes();
        assert_eq!(&bytes[..12], b"double_reset");
        assert!(bytes[12..16].iter().all(|b| *b == 0));
        assert_eq!(&bytes[16..21], b"state");
        assert!(bytes[21..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_absent_reads_false() {
        let storage = MemoryStorage::new();
        let flag = PersistedFlag::new(&storage);
        assert!(!block_on(flag.get()).unwrap());
    }

    #[test]
    fn test_any_nonzero_byte_is_set() {
        let storage = MemoryStorage::with_value(7);
        let flag = PersistedFlag::new(&storage);
        assert!(block_on(flag.get()).unwrap());

        let storage = MemoryStorage::with_value(0);
        let flag = PersistedFlag::new(&storage);
        assert!(!block_on(flag.get()).unwrap());
    }

    #[test]
    fn test_set_is_idempotent() {
        let storage = MemoryStorage::new();
        let flag = PersistedFlag::new(&storage);

        block_on(flag.write(true)).unwrap();
        block_on(flag.write(true)).unwrap();

        assert_eq!(storage.value(), Some(1));
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let storage = MemoryStorage::with_value(1);
        let flag = PersistedFlag::new(&storage);

        block_on(flag.write(false)).unwrap();
        block_on(flag.write(false)).unwrap();

        assert_eq!(storage.value(), None);
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_read_failure_is_unavailable() {
        let storage = MemoryStorage::new();
        storage.inject(Fault::Load);
        let flag = PersistedFlag::new(&storage);

        assert!(matches!(
            block_on(flag.get()),
            Err(DoubleResetError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let storage = MemoryStorage::new();
        storage.inject(Fault::Store);
        let flag = PersistedFlag::new(&storage);

        assert!(matches!(
            block_on(flag.set()),
            Err(DoubleResetError::StorageWrite(_))
        ));
        assert_eq!(storage.value(), None);
    }
}
