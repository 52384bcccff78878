//! Process-local invalidation transport over a tokio broadcast channel.
//!
//! Stands in for the cross-view shared-storage signal of the original
//! deployment: every concurrently running view subscribes, and a payment
//! completed in one view invalidates the others. Delivery is at-least-once;
//! a receiver that falls behind gets a [`InvalidationError::Lagged`] item
//! and should refresh unconditionally.

use bookline_core::booking::BookingId;
use bookline_core::invalidation::{InvalidationBus, InvalidationError, InvalidationStream};
use futures::stream;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Default channel capacity. Invalidations are tiny and bursts are short; a
/// receiver that misses more than this is told it lagged.
const DEFAULT_CAPACITY: usize = 64;

/// [`InvalidationBus`] backed by `tokio::sync::broadcast`.
#[derive(Debug, Clone)]
pub struct BroadcastInvalidationBus {
    tx: broadcast::Sender<BookingId>,
}

impl BroadcastInvalidationBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` undelivered invalidations
    /// per receiver.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastInvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationBus for BroadcastInvalidationBus {
    fn publish(
        &self,
        booking_id: &BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<(), InvalidationError>> + Send + '_>> {
        // A send error only means no receiver exists right now; with
        // at-least-once semantics and no durable log that is a successful
        // publish to zero subscribers.
        let _ = self.tx.send(booking_id.clone());
        Box::pin(async { Ok(()) })
    }

    fn subscribe(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<InvalidationStream, InvalidationError>> + Send + '_>>
    {
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
