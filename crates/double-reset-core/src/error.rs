use core::fmt::Debug;

use thiserror_no_std::Error;

/// Errors reported by the detector
///
/// `E` is the error type of the [`FlagStorage`](crate::FlagStorage) backend.
#[derive(Error, Debug)]
pub enum DoubleResetError<E: Debug> {
    /// The flag could not be read (store not opened, backend unreachable)
    #[error("flag storage unavailable: {0:?}")]
    StorageUnavailable(E),
    /// Writing or committing the flag failed
    #[error("flag write failed: {0:?}")]
    StorageWrite(E),
    /// The background clear task could not be scheduled
    #[error("failed to spawn the double reset clear task")]
    TaskSpawn,
}
