//! Hardware-independent core of the double-reset detector
//!
//! A headless device with nothing but a reset button can use two resets in
//! quick succession as a "reconfigure me" gesture. This crate holds the
//! platform-agnostic protocol: a persisted one-byte flag, the boot-time
//! decision keyed on the reset cause, and the completion signal that callers
//! wait on while the detection window is open.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod config;
pub mod detector;
pub mod error;
pub mod flag;
pub mod memory_storage;
pub mod reset_cause;
pub mod signal;

pub use config::DEFAULT_TIMEOUT_MS;
pub use detector::{ClearTaskSpawner, DoubleReset, SpawnRejected};
pub use error::DoubleResetError;
pub use flag::{FLAG_KEY, FlagKey, FlagStorage, PersistedFlag};
pub use memory_storage::{Fault, MemoryStorage, MemoryStorageError};
pub use reset_cause::{ResetCause, UnknownResetCause};
pub use signal::{CompletionSignal, WindowState};
