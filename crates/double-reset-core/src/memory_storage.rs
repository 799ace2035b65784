//! RAM-backed [`FlagStorage`] for host tests
//!
//! Values survive only as long as the struct, which is enough to replay a
//! sequence of boots inside one process. Faults can be injected per operation
//! to exercise the error paths.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use thiserror_no_std::Error;

use crate::flag::{FLAG_KEY, FlagKey, FlagStorage};

/// Operation that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Load,
    Store,
    Erase,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStorageError {
    #[error("injected load failure")]
    Load,
    #[error("injected store failure")]
    Store,
    #[error("injected erase failure")]
    Erase,
}

struct State {
    slot: Option<(FlagKey, u8)>,
    writes: usize,
    load_fails: bool,
    store_fails: bool,
    erase_fails: bool,
}

pub struct MemoryStorage {
    state: Mutex<CriticalSectionRawMutex, RefCell<State>>,
}

impl MemoryStorage {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                slot: None,
                writes: 0,
                load_fails: false,
                store_fails: false,
                erase_fails: false,
            })),
        }
    }

    /// Storage that already holds `value` under [`FLAG_KEY`]
    pub fn with_value(value: u8) -> Self {
        let storage = Self::new();
        storage.with_state(|state| state.slot = Some((FLAG_KEY, value)));
        storage
    }

    /// Raw byte currently stored under [`FLAG_KEY`]
    pub fn value(&self) -> Option<u8> {
        self.with_state(|state| match state.slot {
            Some((key, value)) if key == FLAG_KEY => Some(value),
            _ => None,
        })
    }

    /// Number of successful stores and erases so far
    pub fn writes(&self) -> usize {
        self.with_state(|state| state.writes)
    }

    /// Make every following call of the given operation fail
    pub fn inject(&self, fault: Fault) {
        self.with_state(|state| match fault {
            Fault::Load => state.load_fails = true,
            Fault::Store => state.store_fails = true,
            Fault::Erase => state.erase_fails = true,
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagStorage for MemoryStorage {
    type Error = MemoryStorageError;

    async fn load(&self, key: &FlagKey) -> Result<Option<u8>, Self::Error> {
        self.with_state(|state| {
            if state.load_fails {
                return Err(MemoryStorageError::Load);
            }
            Ok(match state.slot {
                Some((stored, value)) if stored == *key => Some(value),
                _ => None,
            })
        })
    }

    async fn store(&self, key: &FlagKey, value: u8) -> Result<(), Self::Error> {
        self.with_state(|state| {
            if state.store_fails {
                return Err(MemoryStorageError::Store);
            }
            state.slot = Some((*key, value));
            state.writes += 1;
            Ok(())
        })
    }

    async fn erase(&self, key: &FlagKey) -> Result<(), Self::Error> {
        self.with_state(|state| {
            if state.erase_fails {
                return Err(MemoryStorageError::Erase);
            }
            if matches!(state.slot, Some((stored, _)) if stored == *key) {
                state.slot = None;
                state.writes += 1;
            }
            Ok(())
        })
    }
}
