//! Platform reset cause and its classification
//!
//! Only two buckets matter to the detector: resets a user can cause with the
//! reset button (power-on and the external reset pin) and everything else.

use core::fmt;
use core::str::FromStr;

/// Reason the platform reports for the most recent reboot.
///
/// The variants follow the ESP-IDF reset classes so firmware can map the
/// hardware register straight onto them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    /// Power was applied to the chip
    PowerOn,
    /// The external reset pin was pulled
    External,
    /// Software requested a restart (including OTA reboots)
    Software,
    /// Restart after a panic or exception
    Panic,
    /// Interrupt watchdog fired
    InterruptWatchdog,
    /// Task watchdog fired
    TaskWatchdog,
    /// Any other watchdog (RTC, super watchdog, ...)
    Watchdog,
    /// Wake-up from deep sleep
    DeepSleep,
    /// Supply voltage dropped below the brownout threshold
    Brownout,
    /// Reset over SDIO
    Sdio,
    /// The platform could not tell
    Unknown,
}

impl ResetCause {
    /// Whether a user pressing the reset button can produce this cause.
    ///
    /// Only these resets count toward a double reset. Note that power-on and
    /// a button press are indistinguishable on most chips.
    pub const fn is_user_reset(self) -> bool {
        matches!(self, Self::PowerOn | Self::External)
    }

    /// Get a short label for logs and the simulator CLI
    pub const fn label(self) -> &'static str {
        match self {
            Self::PowerOn => "power-on",
            Self::External => "external",
            Self::Software => "software",
            Self::Panic => "panic",
            Self::InterruptWatchdog => "int-watchdog",
            Self::TaskWatchdog => "task-watchdog",
            Self::Watchdog => "watchdog",
            Self::DeepSleep => "deep-sleep",
            Self::Brownout => "brownout",
            Self::Sdio => "sdio",
            Self::Unknown => "unknown",
        }
    }

    /// All causes, in declaration order
    pub const ALL: [ResetCause; 11] = [
        Self::PowerOn,
        Self::External,
        Self::Software,
        Self::Panic,
        Self::InterruptWatchdog,
        Self::TaskWatchdog,
        Self::Watchdog,
        Self::DeepSleep,
        Self::Brownout,
        Self::Sdio,
        Self::Unknown,
    ];
}

impl fmt::Display for ResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string names no known reset cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownResetCause;

impl fmt::Display for UnknownResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown reset cause")
    }
}

impl core::error::Error for UnknownResetCause {}

impl FromStr for ResetCause {
    type Err = UnknownResetCause;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|cause| cause.label().eq_ignore_ascii_case(s))
            .ok_or(UnknownResetCause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_button_resets_count() {
        let user: usize = ResetCause::ALL
            .iter()
            .filter(|cause| cause.is_user_reset())
            .count();
        assert_eq!(user, 2);
        assert!(ResetCause::PowerOn.is_user_reset());
        assert!(ResetCause::External.is_user_reset());
        assert!(!ResetCause::Software.is_user_reset());
        assert!(!ResetCause::TaskWatchdog.is_user_reset());
        assert!(!ResetCause::DeepSleep.is_user_reset());
        assert!(!ResetCause::Unknown.is_user_reset());
    }

    #[test]
    fn test_parse_labels() {
        for cause in ResetCause::ALL {
            assert_eq!(cause.label().parse::<ResetCause>(), Ok(cause));
        }
        assert_eq!("Power-On".parse::<ResetCause>(), Ok(ResetCause::PowerOn));
        assert_eq!("reboot".parse::<ResetCause>(), Err(UnknownResetCause));
    }
}
