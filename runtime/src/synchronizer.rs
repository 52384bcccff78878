//! The booking data synchronizer.
//!
//! Maintains the view's advisory copy of the backend's booking list and owns
//! every rule about when and how it is refreshed.

use crate::error::SyncError;
use bookline_client::BookingApi;
use bookline_core::booking::{Booking, BookingId};
use bookline_core::classifier::any_pending_payment;
use bookline_core::environment::Clock;
use bookline_core::invalidation::{CacheInvalidator, InvalidationError};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type FetchFuture = Shared<BoxFuture<'static, Result<Vec<Booking>, SyncError>>>;

/// One outstanding fetch. `bypass` records whether it carries the
/// cache-busting nonce: a plain fetch cannot satisfy a bypass caller.
struct InFlight {
    bypass: bool,
    generation: u64,
    fut: FetchFuture,
}

struct Inner {
    api: Arc<dyn BookingApi>,
    invalidator: Arc<CacheInvalidator>,
    clock: Arc<dyn Clock>,
    /// The snapshot. Replaced wholesale on every successful fetch.
    bookings: RwLock<Vec<Booking>>,
    /// The current fetch, if any. Callers it satisfies join it; a bypass
    /// caller finding only a plain fetch supersedes it.
    in_flight: Mutex<Option<InFlight>>,
    /// Monotonic counter handing each fetch its generation.
    next_generation: AtomicU64,
    /// Generation of the fetch whose result the snapshot currently holds.
    /// A superseded fetch resolving late must not roll the snapshot back.
    applied_generation: AtomicU64,
    /// True while any booking's payment is PENDING. Recomputed after every
    /// successful fetch; the poller parks on this.
    pending_tx: watch::Sender<bool>,
}

/// Orchestrates fetching the authoritative booking list.
///
/// Cheap to clone; clones share the same snapshot and in-flight guard.
///
/// # Refresh lifecycle
///
/// Each refresh is `Idle → Fetching → Idle` whether it succeeds or fails.
/// While one fetch is outstanding, further refresh requests it can satisfy
/// join it instead of issuing a second network request; a cache-busting
/// request arriving mid-plain-fetch starts its own forced fetch. A failed
/// fetch leaves the snapshot exactly as it was: no partial overwrite, no
/// silent data loss.
///
/// # Example
///
/// ```no_run
/// use bookline_client::HttpBookingApi;
/// use bookline_core::booking::BookingId;
/// use bookline_core::environment::SystemClock;
/// use bookline_core::invalidation::CacheInvalidator;
/// use bookline_runtime::{BroadcastInvalidationBus, Synchronizer};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = Arc::new(HttpBookingApi::new("https://app.example.com")?);
/// let bus = Arc::new(BroadcastInvalidationBus::new());
/// let invalidator = Arc::new(CacheInvalidator::new(bus));
/// let sync = Synchronizer::new(api, invalidator, Arc::new(SystemClock));
///
/// let bookings = sync.fetch_all(false).await?;
/// let fresh = sync.refresh_one(&BookingId::from("bk_1")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<Inner>,
}

impl Synchronizer {
    /// Create a synchronizer with an empty snapshot.
    #[must_use]
    pub fn new(
        api: Arc<dyn BookingApi>,
        invalidator: Arc<CacheInvalidator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (pending_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                api,
                invalidator,
                clock,
                bookings: RwLock::new(Vec::new()),
                in_flight: Mutex::new(None),
                next_generation: AtomicU64::new(0),
                applied_generation: AtomicU64::new(0),
                pending_tx,
            }),
        }
    }

    /// Current snapshot of the booking list.
    ///
    /// Advisory: may be stale at any moment. Empty until the first
    /// successful fetch.
    #[must_use]
    pub fn bookings(&self) -> Vec<Booking> {
        self.inner
            .bookings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Watch the "any booking has a pending payment" predicate.
    ///
    /// Updated after every successful fetch. Drives the polling policy.
    #[must_use]
    pub fn pending_payments_watch(&self) -> watch::Receiver<bool> {
        self.inner.pending_tx.subscribe()
    }

    /// The stale-marker registry this synchronizer clears on fetch.
    #[must_use]
    pub fn invalidator(&self) -> &Arc<CacheInvalidator> {
        &self.inner.invalidator
    }

    /// Fetch the full booking collection and replace the snapshot.
    ///
    /// If a fetch that satisfies this caller is already in flight, joins it
    /// and returns that fetch's result. A cache-busted fetch satisfies every
    /// caller; a plain fetch satisfies only plain callers, so a bypass
    /// request arriving while a plain fetch is outstanding starts its own
    /// forced fetch rather than accepting a possibly pre-mutation response.
    ///
    /// With `bypass_cache` the request carries a one-time `?t=<millis>`
    /// nonce so intermediate HTTP caches cannot serve a pre-mutation
    /// response.
    ///
    /// On success the whole snapshot is replaced atomically, the stale
    /// markers that were set when the fetch started are cleared (the fetch
    /// is authoritative for the entire collection, including bookings that
    /// no longer appear in it), and the pending-payment predicate is
    /// republished. A superseded fetch resolving after a newer one leaves
    /// the snapshot and markers alone.
    ///
    /// # Errors
    ///
    /// [`SyncError`] when the backend request fails; the snapshot is left
    /// untouched and retry is up to the caller (manual action, next poll or
    /// focus tick).
    pub async fn fetch_all(&self, bypass_cache: bool) -> Result<Vec<Booking>, SyncError> {
        let fut = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(existing) if existing.bypass || !bypass_cache => {
                    tracing::debug!("joining in-flight booking fetch");
                    existing.fut.clone()
                }
                _ => {
                    let generation = self
                        .inner
                        .next_generation
                        .fetch_add(1, Ordering::Relaxed)
                        + 1;
                    let fut =
                        Self::start_fetch(Arc::clone(&self.inner), bypass_cache, generation);
                    *slot = Some(InFlight {
                        bypass: bypass_cache,
                        generation,
                        fut: fut.clone(),
                    });
                    fut
                }
            }
        };

        fut.await
    }

    /// Build the shared fetch future. The future clears the in-flight slot
    /// itself just before resolving, unless a newer fetch already took the
    /// slot over.
    fn start_fetch(inner: Arc<Inner>, bypass_cache: bool, generation: u64) -> FetchFuture {
        async move {
            // Markers set after this point belong to mutations this request
            // may not observe; only the ones captured here are proven
            // covered by it.
            let stale_at_start = inner.invalidator.stale_ids();
            let nonce = bypass_cache.then(|| inner.clock.now().timestamp_millis());
            let result = inner.api.list_my_bookings(nonce).await;

            let outcome = match result {
                Ok(bookings) => {
                    let applied = {
                        let mut snapshot = inner
                            .bookings
                            .write()
                            .unwrap_or_else(PoisonError::into_inner);
                        if generation > inner.applied_generation.load(Ordering::Acquire) {
                            *snapshot = bookings.clone();
                            inner.applied_generation.store(generation, Ordering::Release);
                            true
                        } else {
                            false
                        }
                    };

                    if applied {
                        for id in &stale_at_start {
                            inner.invalidator.clear_stale(id);
                        }
                        let pending = any_pending_payment(&bookings);
                        inner.pending_tx.send_replace(pending);
                        tracing::debug!(
                            count = bookings.len(),
                            pending_payments = pending,
                            "booking snapshot replaced"
                        );
                    } else {
                        tracing::debug!("fetch superseded by a newer one, result not applied");
                    }
                    Ok(bookings)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "booking fetch failed, keeping last-known snapshot");
                    Err(SyncError::from(err))
                }
            };

            let mut slot = inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|f| f.generation == generation) {
                *slot = None;
            }

            outcome
        }
        .boxed()
        .shared()
    }

    /// Refresh one booking: mark it stale, force-fetch the full list, and
    /// return the fresh record.
    ///
    /// The backend exposes no single-booking refresh endpoint, so this
    /// re-fetches the whole collection and filters. Returns `None` when the
    /// booking no longer appears in the list.
    ///
    /// Two back-to-back calls while the first request is outstanding issue
    /// exactly one network request and observe the same result.
    ///
    /// # Errors
    ///
    /// [`SyncError`] when the underlying fetch fails.
    pub async fn refresh_one(&self, id: &BookingId) -> Result<Option<Booking>, SyncError> {
        if let Err(err) = self.inner.invalidator.mark_stale(id).await {
            // The local marker is already set; only the cross-view broadcast
            // was lost.
            tracing::warn!(booking_id = %id, error = %err, "invalidation broadcast failed");
        }

        let bookings = self.fetch_all(true).await?;
        Ok(bookings.into_iter().find(|b| &b.id == id))
    }

    /// Force-fetch if any stale marker is set; no-op otherwise.
    ///
    /// # Errors
    ///
    /// [`SyncError`] when a fetch was needed and failed.
    pub async fn refresh_if_stale(&self) -> Result<(), SyncError> {
        if self.inner.invalidator.any_stale() {
            self.fetch_all(true).await?;
        }
        Ok(())
    }

    /// Focus-triggered refresh: the view just regained foreground
    /// visibility.
    ///
    /// If any booking has a pending payment, one immediate force-fetch runs
    /// so a settlement that happened while the view was backgrounded shows
    /// up without waiting for the next poll tick. Failures are logged, not
    /// surfaced: like poll ticks, this was not user-initiated.
    pub async fn notify_foreground(&self) {
        if !any_pending_payment(&self.bookings()) {
            return;
        }
        if let Err(err) = self.fetch_all(true).await {
            tracing::warn!(error = %err, "foreground refresh failed");
        }
    }

    /// Spawn a task applying invalidations broadcast by other views.
    ///
    /// Each received booking id is marked stale locally (idempotent, no
    /// re-broadcast) and followed by a force-fetch. A lagged receiver lost
    /// invalidations it cannot identify, so it refreshes unconditionally.
    ///
    /// The subscription is established before this returns, so no
    /// invalidation published afterwards can be missed. The task ends when
    /// the bus closes; abort the handle to detach early.
    ///
    /// # Errors
    ///
    /// [`InvalidationError::SubscriptionFailed`] when the bus cannot be
    /// subscribed to.
    pub async fn spawn_invalidation_listener(&self) -> Result<JoinHandle<()>, InvalidationError> {
        let mut stream = self.inner.invalidator.subscribe().await?;
        let sync = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(id) => {
                        sync.inner.invalidator.mark_stale_local(&id);
                        tracing::debug!(booking_id = %id, "invalidation received");
                    }
                    Err(InvalidationError::Lagged { missed }) => {
                        tracing::warn!(missed, "invalidation receiver lagged, forcing refresh");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "invalidation stream failed");
                        return;
                    }
                }

                if let Err(err) = sync.fetch_all(true).await {
                    tracing::warn!(error = %err, "invalidation-triggered refresh failed");
                }
            }
        }))
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("bookings", &self.bookings().len())
            .finish_non_exhaustive()
    }
}
