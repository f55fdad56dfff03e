use chrono::NaiveDate;

use crate::model::{Booking, BookingStatus, UtilizationStats};

/// Modeled room capacity per calendar day. Policy constant, not derived
/// from the classroom.
const HOURS_PER_DAY: f64 = 8.0;

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Aggregate a booking set over an inclusive date range. Pure function.
pub fn utilization(bookings: &[Booking], from: NaiveDate, to: NaiveDate) -> UtilizationStats {
    let total_sessions = bookings.len();
    let completed_sessions = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .count();
    let cancelled_sessions = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Cancelled)
        .count();
    let total_hours: f64 = bookings.iter().map(|b| b.range.duration_hours()).sum();

    let days = (to - from).num_days() + 1;
    let available_hours = if days > 0 {
        days as f64 * HOURS_PER_DAY
    } else {
        0.0
    };

    let utilization_rate = if available_hours > 0.0 {
        round2(total_hours / available_hours * 100.0)
    } else {
        0.0
    };
    let completion_rate = if total_sessions > 0 {
        round2(completed_sessions as f64 / total_sessions as f64 * 100.0)
    } else {
        0.0
    };

    UtilizationStats {
        total_sessions,
        completed_sessions,
        cancelled_sessions,
        total_hours,
        available_hours,
        utilization_rate,
        completion_rate,
    }
}
