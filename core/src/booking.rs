//! Domain model for bookings and payments as exchanged with the backend.
//!
//! All durable state is backend-owned. The types here are the client's
//! advisory copy: deserialized from the JSON wire format, held read-only,
//! and replaced wholesale on every successful fetch.
//!
//! # Unknown statuses
//!
//! The backend may introduce status values this client does not know about.
//! Both [`BookingStatus`] and [`PaymentStatus`] carry an `Unknown(String)`
//! variant that preserves the raw wire string bit-for-bit, so an unrecognized
//! status renders as its own name and re-serializes unchanged instead of
//! failing deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque unique identifier of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl BookingId {
    /// Create a booking id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle status of a booking.
///
/// The transition graph is backend-owned and monotonic along the listed
/// order, except that [`Cancelled`](Self::Cancelled) and
/// [`Disputed`](Self::Disputed) are terminal from any non-terminal state.
/// The client only classifies status values; it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    /// Booked, awaiting provider confirmation.
    Pending,
    /// Provider has confirmed the booking.
    Confirmed,
    /// Paid and waiting for the scheduled date.
    PendingExecution,
    /// Service is being performed.
    InProgress,
    /// Provider finished; client must confirm completion.
    AwaitingConfirmation,
    /// Completion confirmed, escrow released.
    Completed,
    /// Terminal: cancelled before execution.
    Cancelled,
    /// Terminal: under dispute.
    Disputed,
    /// Any status string not in the enumerated set, preserved verbatim.
    Unknown(String),
}

impl BookingStatus {
    /// The wire-format string for this status.
    ///
    /// For [`Unknown`](Self::Unknown) this is the raw backend string, which
    /// doubles as the fallback display label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::PendingExecution => "PENDING_EXECUTION",
            Self::InProgress => "IN_PROGRESS",
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Disputed)
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "CONFIRMED" => Self::Confirmed,
            "PENDING_EXECUTION" => Self::PendingExecution,
            "IN_PROGRESS" => Self::InProgress,
            "AWAITING_CONFIRMATION" => Self::AwaitingConfirmation,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "DISPUTED" => Self::Disputed,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Settlement status of a payment.
///
/// `ESCROW` and `HELD_IN_ESCROW` are distinct wire values for the same
/// funds-held stage; both count as paid for timeline purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Initiated, settlement not yet observed.
    Pending,
    /// Funds held by the platform.
    Escrow,
    /// Funds held by the platform (alternate wire spelling).
    HeldInEscrow,
    /// Escrow released to the provider.
    Released,
    /// Fully settled.
    Completed,
    /// Settlement failed.
    Failed,
    /// Refunded to the client.
    Refunded,
    /// Any status string not in the enumerated set, preserved verbatim.
    Unknown(String),
}

impl PaymentStatus {
    /// The wire-format string for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Escrow => "ESCROW",
            Self::HeldInEscrow => "HELD_IN_ESCROW",
            Self::Released => "RELEASED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether funds have been captured (escrowed or beyond).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Escrow | Self::HeldInEscrow | Self::Released | Self::Completed
        )
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "ESCROW" => Self::Escrow,
            "HELD_IN_ESCROW" => Self::HeldInEscrow,
            "RELEASED" => Self::Released,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "REFUNDED" => Self::Refunded,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A payment associated with a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Opaque payment identifier.
    pub id: String,
    /// Settlement status, backend-owned.
    pub status: PaymentStatus,
    /// Amount charged, non-negative.
    pub amount: f64,
    /// When the payment was initiated.
    pub created_at: DateTime<Utc>,
}

/// A scheduled service engagement between a client and a provider.
///
/// `service`, `provider`, and `review` are descriptive associations the core
/// never interprets beyond presence checks; they pass through as raw JSON
/// for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Opaque unique identifier.
    pub id: BookingId,
    /// Lifecycle status, backend-owned.
    pub status: BookingStatus,
    /// When the service is scheduled to happen.
    pub scheduled_date: DateTime<Utc>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// Total price, non-negative.
    pub total_amount: f64,
    /// Associated payment, absent until payment is initiated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    /// Booked service, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<serde_json::Value>,
    /// Provider, opaque to the core (presence gates messaging).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<serde_json::Value>,
    /// Review left by the client, opaque (presence gates disputes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<serde_json::Value>,
}

impl Booking {
    /// Whether this booking's payment is initiated but not yet settled.
    ///
    /// This is the predicate that keeps the poller alive: settlement is
    /// asynchronous and backend-driven, so the client re-fetches while any
    /// booking reports a pending payment.
    #[must_use]
    pub fn has_pending_payment(&self) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|p| p.status == PaymentStatus::Pending)
    }
}
