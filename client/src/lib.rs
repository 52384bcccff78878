//! # Bookline Client
//!
//! HTTP/JSON client for the booking backend.
//!
//! All endpoints are same-origin and cookie-authenticated; the backend owns
//! every durable record. This crate provides:
//!
//! - [`BookingApi`] — the dyn-compatible trait the runtime programs against
//! - [`HttpBookingApi`] — the reqwest implementation
//! - [`ApiError`] — the error taxonomy (network, HTTP, malformed response,
//!   unauthorized)
//!
//! ## Example
//!
//! ```no_run
//! use bookline_client::HttpBookingApi;
//!
//! # async fn example() -> Result<(), bookline_client::ApiError> {
//! let api = HttpBookingApi::new("https://app.example.com")?;
//! let bookings = api.list_my_bookings(None).await?;
//! println!("{} bookings", bookings.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{BookingApi, HttpBookingApi};
pub use error::ApiError;
pub use types::{Service, User};
