//! Time source for load timestamps.
//!
//! A [`ConfigDocument`](crate::document::ConfigDocument) records when it last
//! loaded its file and compares that instant against the file's modification
//! time. The [`Clock`] trait lets tests pin that instant.
//!
//! ```
//! use thunderfile::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(now.timestamp_millis() > 0);
//! ```

use std::fmt::Debug;

use chrono::{DateTime, TimeZone, Utc};

#[cfg(any(test, feature = "testing"))]
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A source of wall-clock timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current instant as milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real system time via [`chrono::Utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Converts epoch milliseconds to a UTC instant, clamping values chrono
/// cannot represent to the epoch.
pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Manually driven clock for tests.
///
/// Unlike a real clock it never moves on its own; call
/// [`advance`](FixedClock::advance) or [`set`](FixedClock::set).
///
/// ```
/// use thunderfile::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1_000);
/// assert_eq!(clock.now_millis(), 1_000);
/// clock.advance(500);
/// assert_eq!(clock.now_millis(), 1_500);
/// ```
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    millis: Mutex<i64>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a clock frozen at the given epoch milliseconds.
    pub fn new(millis: i64) -> Self {
        Self {
            millis: Mutex::new(millis),
        }
    }

    fn state(&self) -> MutexGuard<'_, i64> {
        self.millis.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: i64) {
        *self.state() += ms;
    }

    /// Jump to a specific time.
    pub fn set(&self, ms: i64) {
        *self.state() = ms;
    }

    /// Current time in milliseconds.
    pub fn get(&self) -> i64 {
        *self.state()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        from_millis(self.get())
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedClock")
            .field("millis", &self.get())
            .finish()
    }
}
