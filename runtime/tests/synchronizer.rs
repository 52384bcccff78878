//! Integration tests for the synchronizer's fetch lifecycle: snapshot
//! replacement, failure semantics, in-flight dedup, and stale-payment
//! reconciliation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use bookline_client::HttpBookingApi;
use bookline_core::booking::{BookingId, PaymentStatus};
use bookline_core::classifier;
use bookline_core::invalidation::{CacheInvalidator, InvalidationBus};
use bookline_runtime::Synchronizer;
use bookline_testing::{BookingFixture, InMemoryInvalidationBus, test_clock};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Millisecond timestamp of the fixed test clock (2026-01-01T00:00:00Z),
/// i.e. the cache-busting nonce every forced fetch carries.
const NONCE: &str = "1767225600000";

struct Harness {
    server: MockServer,
    sync: Synchronizer,
    bus: Arc<InMemoryInvalidationBus>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let bus = Arc::new(InMemoryInvalidationBus::new());
    let invalidator = Arc::new(CacheInvalidator::new(
        Arc::clone(&bus) as Arc<dyn InvalidationBus>
    ));
    let api = HttpBookingApi::new(server.uri()).expect("client builds");
    let sync = Synchronizer::new(Arc::new(api), invalidator, Arc::new(test_clock()));
    Harness { server, sync, bus }
}

fn bookings_body(bookings: &[serde_json::Value]) -> serde_json::Value {
    json!({ "bookings": bookings })
}

#[tokio::test]
async fn fetch_replaces_snapshot_and_updates_pending_watch() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("bk_1")
                .status("CONFIRMED")
                .payment("PENDING")
                .build_json(),
        ])))
        .mount(&h.server)
        .await;

    assert!(h.sync.bookings().is_empty());
    let watch = h.sync.pending_payments_watch();
    assert!(!*watch.borrow());

    let fetched = h.sync.fetch_all(false).await.expect("fetch succeeds");
    assert_eq!(fetched.len(), 1);
    assert_eq!(h.sync.bookings(), fetched);
    assert!(*watch.borrow(), "pending payment must flip the watch");
}

#[tokio::test]
async fn failed_fetch_keeps_last_known_snapshot() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("bk_1").status("CONFIRMED").build_json(),
        ])))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "backend down" })))
        .mount(&h.server)
        .await;

    let first = h.sync.fetch_all(false).await.expect("first fetch succeeds");
    assert_eq!(first.len(), 1);

    let err = h.sync.fetch_all(false).await.expect_err("second fetch fails");
    assert!(err.is_transient(), "{err:?}");
    // No partial overwrite, no silent data loss.
    assert_eq!(h.sync.bookings(), first);
}

#[tokio::test]
async fn concurrent_refresh_issues_exactly_one_request() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bookings_body(&[
                    BookingFixture::new("B2").status("CONFIRMED").build_json(),
                ]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let id = BookingId::from("B2");
    let (a, b) = tokio::join!(h.sync.refresh_one(&id), h.sync.refresh_one(&id));

    let a = a.expect("first caller succeeds");
    let b = b.expect("second caller succeeds");
    assert_eq!(a, b, "both callers observe the same resolved result");
    assert_eq!(a.expect("booking present").id, id);
}

#[tokio::test]
async fn bypass_request_supersedes_plain_in_flight_fetch() {
    let h = harness().await;
    // Slow plain fetch still carrying the pre-mutation payment state.
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param_is_missing("t"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bookings_body(&[
                    BookingFixture::new("B1")
                        .status("PENDING_EXECUTION")
                        .payment("PENDING")
                        .build_json(),
                ]))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("B1")
                .status("PENDING_EXECUTION")
                .payment("ESCROW")
                .build_json(),
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let plain = tokio::spawn({
        let sync = h.sync.clone();
        async move { sync.fetch_all(false).await }
    });
    // Let the plain fetch reach the wire before the payment callback lands.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The payment callback must not be absorbed by the plain fetch: a
    // cache-busted request goes out and the fresh record comes back.
    let id = BookingId::from("B1");
    let fresh = h
        .sync
        .refresh_one(&id)
        .await
        .expect("refresh succeeds")
        .expect("B1 still listed");
    assert_eq!(
        fresh.payment.as_ref().map(|p| p.status.clone()),
        Some(PaymentStatus::Escrow)
    );
    assert!(
        !h.sync.invalidator().is_stale(&id),
        "marker cleared by the forced fetch that covered it"
    );

    // The slow plain fetch resolves afterwards; it must not roll the
    // snapshot back to the pre-mutation state.
    plain
        .await
        .expect("task joins")
        .expect("plain fetch succeeds");
    assert_eq!(
        h.sync.bookings()[0]
            .payment
            .as_ref()
            .map(|p| p.status.clone()),
        Some(PaymentStatus::Escrow)
    );
}

#[tokio::test]
async fn vanished_booking_marker_is_cleared_by_full_fetch() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[])))
        .expect(1)
        .mount(&h.server)
        .await;

    // Cancelled in another view: marked stale here, then absent from the
    // authoritative list.
    let id = BookingId::from("B9");
    h.sync.invalidator().mark_stale_local(&id);
    h.sync.refresh_if_stale().await.expect("fetch succeeds");
    assert!(
        !h.sync.invalidator().is_stale(&id),
        "the full fetch covers bookings that vanished from the list"
    );

    // With the marker gone this is a no-op, not a forced fetch on every
    // call (expect(1) above).
    h.sync.refresh_if_stale().await.expect("no-op succeeds");
}

#[tokio::test]
async fn stale_payment_reconciliation() {
    let h = harness().await;
    // Initial load: B1's payment still PENDING.
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param_is_missing("t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("B1")
                .status("PENDING_EXECUTION")
                .payment("PENDING")
                .build_json(),
        ])))
        .mount(&h.server)
        .await;
    // Forced refresh after the payment callback: settlement observed.
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("B1")
                .status("PENDING_EXECUTION")
                .payment("ESCROW")
                .build_json(),
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let initial = h.sync.fetch_all(false).await.expect("initial load");
    assert!(!classifier::timeline(&initial[0])[2].completed);
    let watch = h.sync.pending_payments_watch();
    assert!(*watch.borrow());

    // Payment-success callback fires: mark stale, force refresh.
    let id = BookingId::from("B1");
    let fresh = h
        .sync
        .refresh_one(&id)
        .await
        .expect("refresh succeeds")
        .expect("B1 still listed");

    assert_eq!(
        fresh.payment.as_ref().map(|p| p.status.clone()),
        Some(PaymentStatus::Escrow)
    );
    assert!(classifier::timeline(&fresh)[2].completed, "Paid step flips");
    assert!(!*watch.borrow(), "polling predicate stops");
    assert!(!h.sync.invalidator().is_stale(&id), "marker cleared by fetch");
    // The invalidation was broadcast for other views.
    assert_eq!(h.bus.published(), vec![id]);
}

#[tokio::test]
async fn refresh_if_stale_skips_network_when_clean() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[])))
        .expect(0)
        .mount(&h.server)
        .await;

    h.sync.refresh_if_stale().await.expect("no-op succeeds");
}

#[tokio::test]
async fn refresh_if_stale_fetches_when_marked() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("B1").status("CONFIRMED").build_json(),
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let id = BookingId::from("B1");
    h.sync.invalidator().mark_stale_local(&id);
    h.sync.refresh_if_stale().await.expect("fetch succeeds");
    assert!(!h.sync.invalidator().is_stale(&id));
}

#[tokio::test]
async fn invalidation_from_another_view_triggers_refresh() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[
            BookingFixture::new("B7").status("COMPLETED").payment("RELEASED").build_json(),
        ])))
        .mount(&h.server)
        .await;

    let listener = h
        .sync
        .spawn_invalidation_listener()
        .await
        .expect("subscription established");

    // Another view announces a mutation to B7.
    h.bus.publish(&BookingId::from("B7")).await.expect("publish");

    // Eventual consistency: the listener re-fetches on its own schedule.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if !h.sync.bookings().is_empty() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "listener never refreshed"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(h.sync.bookings()[0].id, BookingId::from("B7"));
    listener.abort();
}

#[tokio::test]
async fn refresh_one_reports_missing_booking_as_none() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bookings_body(&[])))
        .mount(&h.server)
        .await;

    let gone = h
        .sync
        .refresh_one(&BookingId::from("vanished"))
        .await
        .expect("fetch succeeds");
    assert!(gone.is_none());
}
