//! # Bookline Testing
//!
//! Testing utilities and helpers for the Bookline crates:
//!
//! - Mock implementations of environment traits ([`mocks::FixedClock`],
//!   [`mocks::InMemoryInvalidationBus`])
//! - Fixture builders for domain values ([`fixtures::BookingFixture`])
//!
//! ## Example
//!
//! ```
//! use bookline_testing::fixtures::BookingFixture;
//! use bookline_core::classifier;
//!
//! let booking = BookingFixture::new("bk_1")
//!     .status("CONFIRMED")
//!     .payment("PENDING")
//!     .build();
//!
//! assert!(booking.has_pending_payment());
//! assert!(!classifier::timeline(&booking)[2].completed);
//! ```

/// Mock implementations for testing.
pub mod mocks {
    use bookline_core::booking::BookingId;
    use bookline_core::environment::Clock;
    use bookline_core::invalidation::{InvalidationBus, InvalidationError, InvalidationStream};
    use chrono::{DateTime, Utc};
    use futures::stream;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Mutex, PoisonError};
    use tokio::sync::broadcast;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bookline_testing::mocks::FixedClock;
    /// use bookline_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
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

    /// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// In-memory invalidation bus that records every publish.
    ///
    /// Delivery matches the production transport (broadcast, at-least-once,
    /// lag reported), with the published ids additionally captured for
    /// assertions.
    #[derive(Debug)]
    pub struct InMemoryInvalidationBus {
        tx: broadcast::Sender<BookingId>,
        published: Mutex<Vec<BookingId>>,
    }

    impl InMemoryInvalidationBus {
        /// Create a bus with room for 64 undelivered invalidations.
        #[must_use]
        pub fn new() -> Self {
            let (tx, _) = broadcast::channel(64);
            Self {
                tx,
                published: Mutex::new(Vec::new()),
            }
        }

        /// Every booking id published so far, in order.
        #[must_use]
        pub fn published(&self) -> Vec<BookingId> {
            self.published
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Default for InMemoryInvalidationBus {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InvalidationBus for InMemoryInvalidationBus {
        fn publish(
            &self,
            booking_id: &BookingId,
        ) -> Pin<Box<dyn Future<Output = Result<(), InvalidationError>> + Send + '_>> {
            self.published
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(booking_id.clone());
            let _ = self.tx.send(booking_id.clone());
            Box::pin(async { Ok(()) })
        }

        fn subscribe(
            &self,
        ) -> Pin<
            Box<dyn Future<Output = Result<InvalidationStream, InvalidationError>> + Send + '_>,
        > {
            let rx = self.tx.subscribe();
            Box::pin(async move {
                let stream = stream::unfold(rx, |mut rx| async move {
                    match rx.recv().await {
                        Ok(id) => Some((Ok(id), rx)),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            Some((Err(InvalidationError::Lagged { missed }), rx))
                        }
                        Err(broadcast::error::RecvError::Closed) => None,
                    }
                });
                Ok(Box::pin(stream) as InvalidationStream)
            })
        }
    }
}

/// Fixture builders for domain values.
pub mod fixtures {
    use bookline_core::booking::{Booking, BookingId, BookingStatus, Payment, PaymentStatus};
    use chrono::{DateTime, TimeZone, Utc};

    /// Builder producing [`Booking`] values with sensible defaults.
    ///
    /// Defaults: status `PENDING`, no payment, a provider attached, no
    /// review, fixed timestamps in 2026.
    #[derive(Debug, Clone)]
    pub struct BookingFixture {
        id: String,
        status: String,
        payment: Option<String>,
        provider: bool,
        review: bool,
        total_amount: f64,
        scheduled_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    }

    impl BookingFixture {
        /// Start a fixture for the given booking id.
        #[must_use]
        #[allow(clippy::unwrap_used)] // hardcoded calendar dates are valid
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                status: "PENDING".to_string(),
                payment: None,
                provider: true,
                review: false,
                total_amount: 120.0,
                scheduled_date: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
                created_at: Utc.with_ymd_and_hms(2026, 8, 20, 8, 0, 0).unwrap(),
            }
        }

        /// Set the booking status (wire string).
        #[must_use]
        pub fn status(mut self, status: &str) -> Self {
            self.status = status.to_string();
            self
        }

        /// Attach a payment with the given status (wire string).
        #[must_use]
        pub fn payment(mut self, status: &str) -> Self {
            self.payment = Some(status.to_string());
            self
        }

        /// Remove the provider association.
        #[must_use]
        pub const fn without_provider(mut self) -> Self {
            self.provider = false;
            self
        }

        /// Attach a review.
        #[must_use]
        pub const fn reviewed(mut self) -> Self {
            self.review = true;
            self
        }

        /// Set the total amount.
        #[must_use]
        pub const fn total_amount(mut self, amount: f64) -> Self {
            self.total_amount = amount;
            self
        }

        /// Build the booking.
        #[must_use]
        pub fn build(self) -> Booking {
            Booking {
                id: BookingId::new(self.id.clone()),
                status: BookingStatus::from(self.status),
                scheduled_date: self.scheduled_date,
                created_at: self.created_at,
                total_amount: self.total_amount,
                payment: self.payment.map(|status| Payment {
                    id: format!("pay_{}", self.id),
                    status: PaymentStatus::from(status),
                    amount: self.total_amount,
                    created_at: self.created_at,
                }),
                service: None,
                provider: self
                    .provider
                    .then(|| serde_json::json!({ "id": format!("pr_{}", self.id) })),
                review: self.review.then(|| serde_json::json!({ "rating": 5 })),
            }
        }

        /// Build and serialize to the wire JSON shape.
        #[must_use]
        #[allow(clippy::expect_used)] // fixture values always serialize
        pub fn build_json(self) -> serde_json::Value {
            serde_json::to_value(self.build()).expect("fixture serializes")
        }
    }
}

// Re-export commonly used items
pub use fixtures::BookingFixture;
pub use mocks::{FixedClock, InMemoryInvalidationBus, test_clock};
