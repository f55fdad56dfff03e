//! Booking status rules, centralized so the compiler checks them
//! exhaustively. Transitions themselves are never blocked here; callers
//! enforce their own pre-conditions and this module labels states and keeps
//! the audit trail.

use chrono::{DateTime, Utc};

use crate::model::{Booking, BookingStatus, StatusChange};

/// True for states whose booking may still be rescheduled or edited.
pub fn is_editable(status: BookingStatus) -> bool {
    match status {
        BookingStatus::Scheduled | BookingStatus::Suspended | BookingStatus::Postponed => true,
        BookingStatus::Ongoing | BookingStatus::Completed | BookingStatus::Cancelled => false,
    }
}

/// True for states occupying (or about to occupy) their time slot.
pub fn is_active(status: BookingStatus) -> bool {
    match status {
        BookingStatus::Scheduled | BookingStatus::Ongoing => true,
        BookingStatus::Completed
        | BookingStatus::Cancelled
        | BookingStatus::Suspended
        | BookingStatus::Postponed => false,
    }
}

/// Terminal states. Finished bookings no longer hold their slot against new
/// conflict checks.
pub fn is_finished(status: BookingStatus) -> bool {
    match status {
        BookingStatus::Completed | BookingStatus::Cancelled => true,
        BookingStatus::Scheduled
        | BookingStatus::Ongoing
        | BookingStatus::Suspended
        | BookingStatus::Postponed => false,
    }
}

/// Set the new status and append a structured audit entry.
pub(crate) fn record_transition(
    booking: &mut Booking,
    to: BookingStatus,
    reason: Option<String>,
    at: DateTime<Utc>,
) {
    booking.history.push(StatusChange {
        at,
        from: booking.status,
        to,
        reason,
    });
    booking.status = to;
}
