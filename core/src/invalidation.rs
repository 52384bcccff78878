//! Cache invalidation: the stale-marker registry and the pub/sub bus that
//! propagates invalidations to other concurrently running views.
//!
//! A *stale marker* is an advisory flag saying cached data for a booking may
//! not reflect the backend anymore. Markers are added after a known mutation
//! (payment callback, manual refresh request), and cleared once a fresh fetch
//! covering that booking succeeds.
//!
//! # Delivery contract
//!
//! The bus is at-least-once: an invalidation may be delivered multiple times,
//! and receivers must treat it as idempotent. Marking a booking stale twice
//! is a set insert both times, so duplicates are harmless by construction.
//! Cross-view consistency is eventual: a receiving view re-runs its own
//! fetch, it never imports another view's state.

use crate::booking::BookingId;
use futures::Stream;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors that can occur during invalidation bus operations.
#[derive(Error, Debug, Clone)]
pub enum InvalidationError {
    /// Failed to publish an invalidation
    #[error("Publish failed for booking '{booking_id}': {reason}")]
    PublishFailed {
        /// The booking whose invalidation could not be published
        booking_id: BookingId,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to invalidations
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The receiver lagged and missed invalidations
    ///
    /// Not fatal: the receiver should treat this as "anything may be stale"
    /// and refresh.
    #[error("Receiver lagged, {missed} invalidations dropped")]
    Lagged {
        /// Number of invalidations dropped
        missed: u64,
    },
}

/// Stream of booking invalidations from a subscription.
pub type InvalidationStream =
    Pin<Box<dyn Stream<Item = Result<BookingId, InvalidationError>> + Send>>;

/// Trait for invalidation transports.
///
/// Any pub/sub transport satisfies the contract as long as delivery is
/// at-least-once and duplicates are tolerated. The shipped implementations
/// are a process-local broadcast channel (runtime crate) and an in-memory
/// recording bus (testing crate).
///
/// # Dyn Compatibility
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so the
/// bus can be held as `Arc<dyn InvalidationBus>` behind the
/// [`CacheInvalidator`].
pub trait InvalidationBus: Send + Sync {
    /// Publish an invalidation for one booking.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidationError::PublishFailed`] if the transport rejects
    /// the publish.
    fn publish(
        &self,
        booking_id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), InvalidationError>> + Send + '_>>;

    /// Subscribe to invalidations published by any view.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidationError::SubscriptionFailed`] if a subscription
    /// cannot be established.
    fn subscribe(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<InvalidationStream, InvalidationError>> + Send + '_>>;
}

/// Injectable stale-marker registry.
///
/// One instance per view. Holds the local set of booking IDs known to need a
/// forced re-fetch, plus the bus used to tell other views. There is no
/// cross-view locking: each view owns its set, and remote invalidations
/// arrive as bus messages applied idempotently.
///
/// The internal lock is interior mutability for `&self` access from async
/// tasks, not a coordination protocol; it is never held across an await.
pub struct CacheInvalidator {
    stale: RwLock<HashSet<BookingId>>,
    bus: Arc<dyn InvalidationBus>,
}

impl CacheInvalidator {
    /// Create a registry publishing on the given bus.
    #[must_use]
    pub fn new(bus: Arc<dyn InvalidationBus>) -> Self {
        Self {
            stale: RwLock::new(HashSet::new()),
            bus,
        }
    }

    /// Mark a booking stale locally and broadcast the invalidation.
    ///
    /// A publish failure is logged by the caller's transport and does not
    /// undo the local marker: the local view must still re-fetch even if no
    /// other view hears about it.
    pub async fn mark_stale(&self, booking_id: &BookingId) -> Result<(), InvalidationError> {
        self.mark_stale_local(booking_id);
        self.bus.publish(booking_id).await
    }

    /// Mark a booking stale without re-broadcasting.
    ///
    /// Used when the invalidation arrived *from* the bus; re-publishing
    /// would echo between views forever.
    pub fn mark_stale_local(&self, booking_id: &BookingId) {
        self.stale
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(booking_id.clone());
    }

    /// Whether a booking is currently marked stale.
    #[must_use]
    pub fn is_stale(&self, booking_id: &BookingId) -> bool {
        self.stale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(booking_id)
    }

    /// Whether any booking is currently marked stale.
    #[must_use]
    pub fn any_stale(&self) -> bool {
        !self
            .stale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Clear a booking's stale marker after a fetch covering it succeeds.
    pub fn clear_stale(&self, booking_id: &BookingId) {
        self.stale
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(booking_id);
    }

    /// Snapshot of the currently stale booking IDs.
    #[must_use]
    pub fn stale_ids(&self) -> Vec<BookingId> {
        self.stale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Subscribe to invalidations from other views.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidationError::SubscriptionFailed`] if the underlying
    /// bus cannot establish a subscription.
    pub async fn subscribe(&self) -> Result<InvalidationStream, InvalidationError> {
        self.bus.subscribe().await
    }
}

impl std::fmt::Debug for CacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidator")
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}
