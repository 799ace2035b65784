//! One-shot completion signal with any number of waiters
//!
//! Once resolved the signal stays resolved until the next `rearm`, which the
//! detector only does at the start of a boot. Every waiter observes the same
//! resolution.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::Duration;

use crate::config::{DEFAULT_TIMEOUT, MAX_WAITERS};

/// Per-boot state of the detection window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// `start()` has not decided yet
    Unresolved,
    /// Decided synchronously, no window was opened
    ImmediateVerdict,
    /// Flag is set and the clear task is counting down
    WindowOpen,
    /// The clear task finished
    WindowClosed,
}

impl WindowState {
    /// Whether the completion signal is set in this state
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::ImmediateVerdict | Self::WindowClosed)
    }
}

struct Inner {
    state: WindowState,
    timeout: Duration,
    wakers: MultiWakerRegistration<MAX_WAITERS>,
}

pub struct CompletionSignal {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

impl CompletionSignal {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                state: WindowState::Unresolved,
                timeout: DEFAULT_TIMEOUT,
                wakers: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Start a new boot: unset the signal and remember the window length.
    pub fn rearm(&self, timeout: Duration) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            inner.state = WindowState::Unresolved;
            inner.timeout = timeout;
        });
    }

    /// Move `Unresolved` to `WindowOpen`. Any other state is left alone.
    pub fn open_window(&self) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.state == WindowState::Unresolved {
                inner.state = WindowState::WindowOpen;
            }
        });
    }

    /// Set the signal, recording which terminal state resolved it, and wake every waiter.
    ///
    /// A signal that is already set keeps its first resolution.
    pub fn resolve(&self, terminal: WindowState) {
        debug_assert!(terminal.is_resolved());
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if !inner.state.is_resolved() {
                inner.state = terminal;
            }
            inner.wakers.wake();
        });
    }

    pub fn state(&self) -> WindowState {
        self.inner.lock(|cell| cell.borrow().state)
    }

    pub fn timeout(&self) -> Duration {
        self.inner.lock(|cell| cell.borrow().timeout)
    }

    pub fn is_set(&self) -> bool {
        self.state().is_resolved()
    }

    /// Complete once the signal is set. Does not time out on its own.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                if inner.state.is_resolved() {
                    Poll::Ready(())
                } else {
                    inner.wakers.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::join::join3;
    use embassy_time::Timer;

    #[test]
    fn test_starts_unset() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_set());
        assert_eq!(signal.state(), WindowState::Unresolved);
    }

    #[test]
    fn test_resolution_is_monotonic() {
        let signal = CompletionSignal::new();
        signal.rearm(Duration::from_millis(10));
        signal.open_window();
        signal.resolve(WindowState::WindowClosed);

        signal.open_window();
        signal.resolve(WindowState::ImmediateVerdict);

        assert_eq!(signal.state(), WindowState::WindowClosed);
        assert!(signal.is_set());
    }

    #[test]
    fn test_rearm_unsets() {
        let signal = CompletionSignal::new();
        signal.resolve(WindowState::ImmediateVerdict);
        signal.rearm(Duration::from_millis(250));

        assert!(!signal.is_set());
        assert_eq!(signal.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_all_waiters_observe_resolution() {
        let signal = CompletionSignal::new();
        signal.rearm(Duration::from_millis(20));
        signal.open_window();

        block_on(join3(signal.wait(), signal.wait(), async {
            Timer::after_millis(20).await;
            signal.resolve(WindowState::WindowClosed);
        }));

        assert!(signal.is_set());
    }

    #[test]
    fn test_wait_on_resolved_signal_returns() {
        let signal = CompletionSignal::new();
        signal.resolve(WindowState::ImmediateVerdict);
        block_on(signal.wait());
    }
}
