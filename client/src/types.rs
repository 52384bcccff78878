//! Wire envelopes and display-only types for the backend endpoints.

use bookline_core::booking::{Booking, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Envelope of `GET /api/bookings/my-bookings`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BookingsEnvelope {
    pub bookings: Vec<Booking>,
}

/// Envelope of `GET /api/book-service/{id}/payment-status`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaymentStatusEnvelope {
    pub status: PaymentStatus,
}

/// Structured error body some non-2xx responses carry.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Envelope of `GET /api/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

/// The authenticated user. Display-only; the core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Display name, if the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Account email, if the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A bookable service from the catalog. Display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Opaque service identifier.
    pub id: String,
    /// Service name.
    pub name: String,
    /// Listed price, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
