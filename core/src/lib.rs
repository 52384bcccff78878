//! # Bookline Core
//!
//! Domain types and pure logic for the Bookline booking dashboard core.
//!
//! This crate provides the pieces that need no I/O:
//!
//! - **Domain model**: [`booking::Booking`], [`booking::Payment`], and their
//!   status enums as exchanged with the backend
//! - **Classifier**: pure derivation of the five-step progress timeline and
//!   the action-eligibility predicates from `(status, payment)`
//! - **Invalidation**: the stale-marker registry ([`invalidation::CacheInvalidator`])
//!   and the [`invalidation::InvalidationBus`] pub/sub trait used to propagate
//!   invalidations across concurrently running views
//! - **Environment**: the [`environment::Clock`] trait for injectable time
//!
//! ## Architecture Principles
//!
//! - Derived view state (timeline steps, eligibility flags) is always a pure
//!   function of the current booking, never a stored field
//! - All durable state lives in the backend; anything held here is an
//!   advisory copy that may be stale at any moment
//! - Unrecognized status strings classify soft: they round-trip verbatim and
//!   disable every derived predicate instead of failing
//!
//! ## Example
//!
//! ```
//! use bookline_core::booking::{Booking, BookingStatus};
//! use bookline_core::classifier;
//!
//! let booking: Booking = serde_json::from_str(
//!     r#"{
//!         "id": "bk_1",
//!         "status": "CONFIRMED",
//!         "scheduledDate": "2026-09-01T10:00:00Z",
//!         "createdAt": "2026-08-20T08:00:00Z",
//!         "totalAmount": 120.0
//!     }"#,
//! ).unwrap();
//!
//! let steps = classifier::timeline(&booking);
//! assert!(steps[0].completed); // Booked
//! assert!(steps[1].completed); // Confirmed
//! assert!(!steps[2].completed); // Paid: no payment attached yet
//! assert!(classifier::can_pay(&booking));
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod booking;
pub mod classifier;
pub mod environment;
pub mod invalidation;

pub use booking::{Booking, BookingId, BookingStatus, Payment, PaymentStatus};
pub use invalidation::{CacheInvalidator, InvalidationBus, InvalidationError};
