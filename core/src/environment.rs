//! Injected dependency traits.
//!
//! External capabilities the core needs are abstracted behind traits so
//! production and test implementations can be swapped freely.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Used to derive cache-busting nonces and anywhere "now" matters, so tests
/// can pin time instead of racing the wall clock.
///
/// # Examples
///
/// ```
/// use bookline_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now.timestamp_millis() > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
