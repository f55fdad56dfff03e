use std::collections::BTreeSet;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{AttendanceEvent, AttendanceSummary, EventKind};

use super::utilization::round2;

/// Tally an enrollment's events. `course_days` is the inclusive day span
/// used as the attendance-rate denominator; with no defined span the rate
/// is 0 rather than a division by zero.
pub fn summarize(
    enrollment_id: Ulid,
    events: &[AttendanceEvent],
    course_days: Option<(NaiveDate, NaiveDate)>,
) -> AttendanceSummary {
    let count = |kind: EventKind| events.iter().filter(|e| e.kind == kind).count();

    let unique_days: BTreeSet<NaiveDate> = events.iter().map(|e| e.at.date_naive()).collect();
    let unique_days_attended = unique_days.len();

    let attendance_rate = match course_days {
        Some((start, end)) => {
            let total_days = (end - start).num_days() + 1;
            if total_days > 0 {
                round2(unique_days_attended as f64 / total_days as f64 * 100.0)
            } else {
                0.0
            }
        }
        None => 0.0,
    };

    AttendanceSummary {
        enrollment_id: Some(enrollment_id),
        total_records: events.len(),
        sign_in_count: count(EventKind::SignIn),
        sign_out_count: count(EventKind::SignOut),
        break_out_count: count(EventKind::BreakOut),
        break_in_count: count(EventKind::BreakIn),
        unique_days_attended,
        attendance_rate,
    }
}
