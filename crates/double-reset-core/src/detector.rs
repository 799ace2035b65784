//! Boot-time double-reset detection
//!
//! ## Protocol
//!
//! | Reset cause        | Flag  | Verdict | Flag after | Signal                     |
//! |--------------------|-------|---------|------------|----------------------------|
//! | power-on, external | set   | `true`  | clear      | set before `start` returns |
//! | power-on, external | clear | `false` | set        | set by the clear task      |
//! | anything else      | any   | `false` | clear      | set before `start` returns |
//!
//! The clear task sleeps for the window, clears the flag and sets the signal,
//! even when clearing fails. Only one writer touches the flag at a time: the
//! task is spawned after the boot-time write has been committed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! static DETECTOR: DoubleReset = DoubleReset::new();
//!
//! let reconfigure = DETECTOR
//!     .start(&storage, cause, Duration::from_secs(5), &spawner)
//!     .await
//!     .unwrap_or(false);
//! // ... later, before turning the status LED off
//! DETECTOR.wait().await;
//! ```

use core::fmt::Debug;

use embassy_time::{Duration, Timer, with_timeout};
use log::{debug, error, info, warn};

use crate::error::DoubleResetError;
use crate::flag::{FlagStorage, PersistedFlag};
use crate::reset_cause::ResetCause;
use crate::signal::{CompletionSignal, WindowState};

/// The spawner refused to schedule the clear task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRejected;

/// Schedules [`DoubleReset::run_clear_window`] on another execution context.
///
/// Implementations own whatever the task needs (the `'static` detector and
/// storage, an executor handle) and must not run the window inline.
pub trait ClearTaskSpawner {
    fn spawn_clear_task(&self) -> Result<(), SpawnRejected>;
}

/// Double-reset detector state for one process lifetime.
///
/// Lives in a `static` on hardware so the clear task can borrow it; tests
/// create one per simulated boot.
pub struct DoubleReset {
    signal: CompletionSignal,
}

impl DoubleReset {
    pub const fn new() -> Self {
        Self {
            signal: CompletionSignal::new(),
        }
    }

    /// Decide whether this boot completes a double reset.
    ///
    /// Must run once per boot, after storage is initialized. Returns `Ok(true)`
    /// when the previous boot armed the window and this one was caused by the
    /// reset button. The completion signal is set before this returns on every
    /// path except a successfully armed window, errors included.
    pub async fn start<S, T>(
        &self,
        storage: &S,
        cause: ResetCause,
        timeout: Duration,
        spawner: &T,
    ) -> Result<bool, DoubleResetError<S::Error>>
    where
        S: FlagStorage,
        T: ClearTaskSpawner,
    {
        self.signal.rearm(timeout);

        let result = self.decide(storage, cause, timeout, spawner).await;
        if result.is_err() {
            self.signal.resolve(WindowState::ImmediateVerdict);
        }
        result
    }

    async fn decide<S, T>(
        &self,
        storage: &S,
        cause: ResetCause,
        timeout: Duration,
        spawner: &T,
    ) -> Result<bool, DoubleResetError<S::Error>>
    where
        S: FlagStorage,
        T: ClearTaskSpawner,
    {
        let flag = PersistedFlag::new(storage);

        if !cause.is_user_reset() {
            // A reboot we did not ask the user for never counts, and must not leave a stale flag
            info!("ignoring, reset cause: {}", cause);
            flag.clear().await?;
            info!("double reset flag cleared");
            self.signal.resolve(WindowState::ImmediateVerdict);
            return Ok(false);
        }

        if flag.get().await? {
            warn!("double reset detected");
            flag.clear().await?;
            info!("double reset flag cleared");
            self.signal.resolve(WindowState::ImmediateVerdict);
            return Ok(true);
        }

        if timeout.as_ticks() == 0 {
            debug!("zero double reset timeout, window not armed");
            self.signal.resolve(WindowState::ImmediateVerdict);
            return Ok(false);
        }

        flag.set().await?;
        info!(
            "double reset flag set, waiting for {} ms",
            timeout.as_millis()
        );

        self.signal.open_window();
        spawner
            .spawn_clear_task()
            .map_err(|_| DoubleResetError::TaskSpawn)?;
        Ok(false)
    }

    /// Body of the background clear task.
    ///
    /// Sleeps for the window armed by [`start`](Self::start), clears the flag
    /// and sets the completion signal. Storage failures are logged only.
    pub async fn run_clear_window<S: FlagStorage>(&self, storage: &S) {
        debug!("double reset task started");

        Timer::after(self.signal.timeout()).await;

        match PersistedFlag::new(storage).clear().await {
            Ok(()) => info!("double reset flag cleared"),
            Err(e) => error!("failed to clear double reset flag in the task: {}", e),
        }

        self.signal.resolve(WindowState::WindowClosed);
    }

    /// Override the stored flag. Does not touch the window or the signal.
    pub async fn set<S: FlagStorage>(
        &self,
        storage: &S,
        state: bool,
    ) -> Result<(), DoubleResetError<S::Error>> {
        PersistedFlag::new(storage).write(state).await
    }

    /// `true` while the completion signal is unset, i.e. while a reset would
    /// still count as the second one. Meaningless before the first `start`.
    pub fn pending(&self) -> bool {
        !self.signal.is_set()
    }

    /// Suspend until the window closes, or at most the window length.
    ///
    /// Use [`pending`](Self::pending) afterwards to tell the two apart.
    pub async fn wait(&self) {
        let timeout = self.signal.timeout();
        if with_timeout(timeout, self.signal.wait()).await.is_err() {
            debug!("double reset wait timed out after {} ms", timeout.as_millis());
        }
    }

    /// [`wait`](Self::wait) for callers outside an async context
    pub fn wait_blocking(&self) {
        embassy_futures::block_on(self.wait())
    }

    pub fn state(&self) -> WindowState {
        self.signal.state()
    }

    /// Window length recorded by the last `start`
    pub fn timeout(&self) -> Duration {
        self.signal.timeout()
    }
}

impl Default for DoubleReset {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for DoubleReset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DoubleReset")
            .field("state", &self.state())
            .field("timeout", &self.timeout())
            .finish()
    }
}
