//! Booking backend client implementation.

use crate::{
    error::ApiError,
    types::{BookingsEnvelope, ErrorBody, PaymentStatusEnvelope, Service, User, UserEnvelope},
};
use bookline_core::booking::{Booking, BookingId, PaymentStatus};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;

/// Backend operations the synchronizer depends on.
///
/// # Dyn Compatibility
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so the
/// runtime can hold `Arc<dyn BookingApi>` and tests can substitute stubs.
pub trait BookingApi: Send + Sync {
    /// Fetch the authenticated user's full booking collection.
    ///
    /// `cache_bust` appends a one-time `?t=<nonce>` query parameter so the
    /// request defeats any intermediate HTTP cache. Required when recent
    /// mutations may have been served from a cached response.
    ///
    /// # Errors
    ///
    /// [`ApiError`] for connectivity failures, non-2xx responses, or a body
    /// missing the `bookings` key.
    fn list_my_bookings(
        &self,
        cache_bust: Option<i64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Booking>, ApiError>> + Send + '_>>;

    /// Cancel a booking. 2xx means success.
    ///
    /// # Errors
    ///
    /// [`ApiError`] with the server-provided message when the backend
    /// rejects the cancellation.
    fn cancel_booking(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>>;

    /// Confirm completion of a booking, releasing escrow server-side.
    ///
    /// # Errors
    ///
    /// [`ApiError`] when the backend rejects the confirmation.
    fn confirm_completion(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>>;

    /// Fetch the current payment status for one booking.
    ///
    /// Used to detect drift between cached state and the backend.
    ///
    /// # Errors
    ///
    /// [`ApiError`] for connectivity failures or a malformed envelope.
    fn payment_status(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentStatus, ApiError>> + Send + '_>>;

    /// Fetch the authenticated user.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] when the session is missing or expired.
    fn current_user(&self)
    -> Pin<Box<dyn Future<Output = Result<User, ApiError>> + Send + '_>>;

    /// Fetch the services catalog. Display-only.
    ///
    /// # Errors
    ///
    /// [`ApiError`] for connectivity failures or a malformed body.
    fn services(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Service>, ApiError>> + Send + '_>>;
}

/// reqwest-backed [`BookingApi`] implementation.
///
/// Same-origin, cookie-authenticated: the client carries a cookie store so
/// the session cookie set at login rides along on every call.
#[derive(Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
}

impl HttpBookingApi {
    /// Create a client rooted at the given origin (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the underlying HTTP client
    /// cannot be built (TLS backend initialization).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a client reusing an existing reqwest `Client`.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the authenticated user's bookings.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::list_my_bookings`].
    pub async fn list_my_bookings(
        &self,
        cache_bust: Option<i64>,
    ) -> Result<Vec<Booking>, ApiError> {
        let mut request = self
            .client
            .get(format!("{}/api/bookings/my-bookings", self.base_url));
        if let Some(nonce) = cache_bust {
            request = request.query(&[("t", nonce)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        let envelope: BookingsEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        Ok(envelope.bookings)
    }

    /// Cancel a booking.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::cancel_booking`].
    pub async fn cancel_booking(&self, id: &BookingId) -> Result<(), ApiError> {
        self.post_action(id, "cancel").await
    }

    /// Confirm completion of a booking.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::confirm_completion`].
    pub async fn confirm_completion(&self, id: &BookingId) -> Result<(), ApiError> {
        self.post_action(id, "confirm-completion").await
    }

    /// Fetch a booking's current payment status.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::payment_status`].
    pub async fn payment_status(&self, id: &BookingId) -> Result<PaymentStatus, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/book-service/{}/payment-status",
                self.base_url, id
            ))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        let envelope: PaymentStatusEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        Ok(envelope.status)
    }

    /// Fetch the authenticated user.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::current_user`].
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        let envelope: UserEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        Ok(envelope.user)
    }

    /// Fetch the services catalog.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::services`].
    pub async fn services(&self) -> Result<Vec<Service>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/services", self.base_url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    async fn post_action(&self, id: &BookingId, action: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/api/book-service/{}/{}",
                self.base_url, id, action
            ))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }
}

/// Map a non-success response to the error taxonomy.
///
/// Prefers the server's structured `{error}` message when the body carries
/// one, falls back to a generic message otherwise.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map_or_else(|_| format!("request failed with status {status}"), |b| b.error);

    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

impl BookingApi for HttpBookingApi {
    fn list_my_bookings(
        &self,
        cache_bust: Option<i64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Booking>, ApiError>> + Send + '_>> {
        Box::pin(Self::list_my_bookings(self, cache_bust))
    }

    fn cancel_booking(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
        let id = id.clone();
        Box::pin(async move { Self::cancel_booking(self, &id).await })
    }

    fn confirm_completion(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
        let id = id.clone();
        Box::pin(async move { Self::confirm_completion(self, &id).await })
    }

    fn payment_status(
        &self,
        id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentStatus, ApiError>> + Send + '_>> {
        let id = id.clone();
        Box::pin(async move { Self::payment_status(self, &id).await })
    }

    fn current_user(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<User, ApiError>> + Send + '_>> {
        Box::pin(Self::current_user(self))
    }

    fn services(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Service>, ApiError>> + Send + '_>> {
        Box::pin(Self::services(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let api = HttpBookingApi::with_client(Client::new(), "https://app.example.com");
        assert_eq!(api.base_url, "https://app.example.com");
    }
}
