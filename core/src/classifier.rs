//! Pure classification of bookings into display categories, progress
//! timelines, and action-eligibility flags.
//!
//! Everything in this module is a deterministic function of
//! `(booking.status, booking.payment)`: no side effects, no I/O, O(1).
//! Derived values are recomputed on every render and never stored, so they
//! cannot drift from the status they were derived from.
//!
//! # Soft failure for unknown statuses
//!
//! A status string outside the enumerated set must never crash rendering.
//! Unknown statuses classify as [`StatusCategory::Unknown`], display their
//! raw wire string as the label, complete none of the status-derived
//! timeline steps, and enable no actions. The `Booked` step alone stays
//! completed, since it reflects the booking's existence rather than its
//! status.

use crate::booking::{Booking, BookingStatus};

/// Semantic display category for badge and timeline-dot coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Awaiting provider confirmation.
    Pending,
    /// Confirmed, not yet started.
    Confirmed,
    /// Paid, waiting for the scheduled date.
    Scheduled,
    /// Service underway.
    Active,
    /// Waiting on the client to confirm completion.
    NeedsAttention,
    /// Successfully completed.
    Success,
    /// Cancelled or disputed.
    Inactive,
    /// Status string outside the enumerated set.
    Unknown,
}

impl From<&BookingStatus> for StatusCategory {
    fn from(status: &BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => Self::Pending,
            BookingStatus::Confirmed => Self::Confirmed,
            BookingStatus::PendingExecution => Self::Scheduled,
            BookingStatus::InProgress => Self::Active,
            BookingStatus::AwaitingConfirmation => Self::NeedsAttention,
            BookingStatus::Completed => Self::Success,
            BookingStatus::Cancelled | BookingStatus::Disputed => Self::Inactive,
            BookingStatus::Unknown(_) => Self::Unknown,
        }
    }
}

/// Display label for a booking status.
///
/// Known statuses get a human-readable label; unknown statuses fall back to
/// the raw wire string so the user still sees something truthful.
#[must_use]
pub fn status_label(status: &BookingStatus) -> &str {
    match status {
        BookingStatus::Pending => "Pending",
        BookingStatus::Confirmed => "Confirmed",
        BookingStatus::PendingExecution => "Scheduled",
        BookingStatus::InProgress => "In progress",
        BookingStatus::AwaitingConfirmation => "Awaiting your confirmation",
        BookingStatus::Completed => "Completed",
        BookingStatus::Cancelled => "Cancelled",
        BookingStatus::Disputed => "Disputed",
        BookingStatus::Unknown(raw) => raw,
    }
}

/// Identifier of one of the five fixed progress milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    /// The booking exists.
    Booked,
    /// The provider confirmed.
    Confirmed,
    /// Funds are captured (escrowed or beyond).
    Paid,
    /// The service is underway or further.
    InProgress,
    /// The booking completed.
    Completed,
}

impl StepId {
    /// Display label for this step.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::Confirmed => "Confirmed",
            Self::Paid => "Paid",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

/// One derived progress milestone. Ephemeral: recomputed per render, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineStep {
    /// Which milestone this is.
    pub id: StepId,
    /// Display label.
    pub label: &'static str,
    /// Whether the booking has reached this milestone.
    pub completed: bool,
}

impl TimelineStep {
    const fn new(id: StepId, completed: bool) -> Self {
        Self {
            id,
            label: id.label(),
            completed,
        }
    }
}

/// Derive the five-step progress timeline for a booking.
///
/// Always returns the same five steps in the same order:
/// `Booked → Confirmed → Paid → In Progress → Completed`.
///
/// - `Booked` is completed for every recognized status
/// - `Confirmed`, `In Progress`, and `Completed` are set-membership tests on
///   the booking status
/// - `Paid` requires a payment to exist with captured funds
///
/// An unrecognized status fails soft: every step reads not-completed rather
/// than erroring, and the raw string still shows through [`status_label`].
#[must_use]
pub fn timeline(booking: &Booking) -> [TimelineStep; 5] {
    let status = &booking.status;

    let booked = !matches!(status, BookingStatus::Unknown(_));
    let confirmed = matches!(
        status,
        BookingStatus::Confirmed
            | BookingStatus::PendingExecution
            | BookingStatus::InProgress
            | BookingStatus::AwaitingConfirmation
            | BookingStatus::Completed
    );
    let paid = booking.payment.as_ref().is_some_and(|p| p.status.is_settled());
    let in_progress = matches!(
        status,
        BookingStatus::InProgress | BookingStatus::AwaitingConfirmation | BookingStatus::Completed
    );
    let completed = *status == BookingStatus::Completed;

    [
        TimelineStep::new(StepId::Booked, booked),
        TimelineStep::new(StepId::Confirmed, confirmed),
        TimelineStep::new(StepId::Paid, paid),
        TimelineStep::new(StepId::InProgress, in_progress),
        TimelineStep::new(StepId::Completed, completed),
    ]
}

/// Whether the cancel control applies: only before execution begins.
#[must_use]
pub const fn can_cancel(booking: &Booking) -> bool {
    matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed
    )
}

/// Whether the pay control applies: confirmed and no payment initiated yet.
#[must_use]
pub const fn can_pay(booking: &Booking) -> bool {
    matches!(booking.status, BookingStatus::Confirmed) && booking.payment.is_none()
}

/// Whether the message-provider control applies.
#[must_use]
pub fn can_message(booking: &Booking) -> bool {
    booking.provider.is_some()
        && matches!(
            booking.status,
            BookingStatus::Confirmed | BookingStatus::InProgress
        )
}

/// Whether the confirm-completion control applies. Confirming releases the
/// escrow server-side.
#[must_use]
pub const fn can_confirm_completion(booking: &Booking) -> bool {
    matches!(booking.status, BookingStatus::AwaitingConfirmation)
}

/// Whether the dispute control applies: settled outcome, no review left.
#[must_use]
pub fn can_dispute(booking: &Booking) -> bool {
    booking.review.is_none()
        && matches!(
            booking.status,
            BookingStatus::Completed | BookingStatus::Cancelled
        )
}

/// All action-eligibility flags for a booking, derived in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionEligibility {
    /// Cancel control visible.
    pub can_cancel: bool,
    /// Pay control visible.
    pub can_pay: bool,
    /// Message-provider control visible.
    pub can_message: bool,
    /// Confirm-completion control visible.
    pub can_confirm_completion: bool,
    /// Dispute control visible.
    pub can_dispute: bool,
}

/// Compute every eligibility flag for a booking.
///
/// Unknown statuses match none of the membership sets, so every flag is
/// false for them.
#[must_use]
pub fn eligibility(booking: &Booking) -> ActionEligibility {
    ActionEligibility {
        can_cancel: can_cancel(booking),
        can_pay: can_pay(booking),
        can_message: can_message(booking),
        can_confirm_completion: can_confirm_completion(booking),
        can_dispute: can_dispute(booking),
    }
}

/// Whether any booking in the list has an unsettled (PENDING) payment.
///
/// Drives the polling policy: the poller runs only while this is true.
#[must_use]
pub fn any_pending_payment(bookings: &[Booking]) -> bool {
    bookings.iter().any(Booking::has_pending_payment)
}
