//! # Bookline Runtime
//!
//! The imperative shell around the pure core: owns the in-memory booking
//! snapshot and its refresh lifecycle.
//!
//! - [`Synchronizer`] — fetches the authoritative booking list, deduplicates
//!   concurrent fetches onto one in-flight request, replaces the snapshot
//!   atomically, clears stale markers, and publishes the "any payment still
//!   pending" predicate on a watch channel
//! - [`PollingTask`] — recurring re-fetch with a `start()`/`stop()`
//!   lifecycle, driven by that predicate so it only runs while there is
//!   something worth polling for
//! - [`BroadcastInvalidationBus`] — process-local invalidation transport
//!   over a tokio broadcast channel
//!
//! # Concurrency model
//!
//! Cooperative and event-driven: interleaved async operations on the tokio
//! runtime, no locked shared resources beyond short-lived snapshot guards.
//! Within one view, fetches are serialized by the in-flight guard; the
//! snapshot is replaced wholesale, never patched field-by-field, so the
//! consumer always sees "last completed fetch wins" for the entire list.

pub mod broadcast_bus;
pub mod poller;
pub mod synchronizer;

/// Error types for the synchronizer boundary.
pub mod error {
    use bookline_client::ApiError;
    use thiserror::Error;

    /// Errors surfaced by refresh operations.
    ///
    /// `Clone` because one in-flight fetch outcome is shared with every
    /// caller that joined it.
    #[derive(Debug, Clone, Error)]
    pub enum SyncError {
        /// The backend request failed; the last-known snapshot is untouched
        #[error("Refresh failed: {0}")]
        Api(#[from] ApiError),
    }

    impl SyncError {
        /// Whether a later poll or focus tick can plausibly succeed.
        ///
        /// Everything except an expired session is transient from the
        /// synchronizer's point of view.
        #[must_use]
        pub const fn is_transient(&self) -> bool {
            !matches!(self, Self::Api(ApiError::Unauthorized))
        }
    }
}

pub use broadcast_bus::BroadcastInvalidationBus;
pub use error::SyncError;
pub use poller::{PollingConfig, PollingTask};
pub use synchronizer::Synchronizer;
