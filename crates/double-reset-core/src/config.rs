use embassy_time::Duration;

/// Detection window used when the application does not pick its own, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// [`DEFAULT_TIMEOUT_MS`] as a [`Duration`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);

/// Number of concurrent `wait()` callers tracked before waiters are woken to re-register
pub const MAX_WAITERS: usize = 4;
