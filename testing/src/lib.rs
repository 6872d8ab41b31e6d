//! # Ticket Booking Testing
//!
//! Testing utilities for reducers and stores of the ticket booking client.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer call
//! - [`assertions`]: Effect assertions (futures, delays, cancellation)
//! - [`mocks::FixedClock`]: Deterministic time
//! - [`helpers::init_test_tracing`]: Opt-in log output for test runs
//!
//! ## Example
//!
//! ```ignore
//! use ticket_booking_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(BookingReducer)
//!     .with_env(test_environment())
//!     .given_state(AppState::default())
//!     .when_action(AppAction::Booking(BookingAction::Book { tier }))
//!     .then_effects(|effects| assertions::assert_no_effects(effects))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use ticket_booking_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_booking_testing::mocks::FixedClock;
    /// use ticket_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

/// Test helpers
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber
    ///
    /// Output is captured by the test harness and filtered with `RUST_LOG`
    /// (default `warn`). Safe to call from every test; only the first call
    /// installs the subscriber.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_init_tracing_twice() {
        helpers::init_test_tracing();
        helpers::init_test_tracing();
    }
}
