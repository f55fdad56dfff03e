use ulid::Ulid;

use crate::limits::MAX_BOOKING_HOURS;
use crate::model::{ClassroomState, Booking, TimeRange};

use super::lifecycle::is_finished;
use super::EngineError;

pub(crate) fn validate_range(range: &TimeRange) -> Result<(), EngineError> {
    if range.start >= range.end {
        return Err(EngineError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    if (range.end - range.start).num_hours() > MAX_BOOKING_HOURS {
        return Err(EngineError::LimitExceeded("booking too long"));
    }
    Ok(())
}

/// Bookings on this classroom overlapping `candidate` under half-open
/// semantics. Finished bookings (cancelled, completed) no longer hold their
/// slot and are filtered out here. `exclude` omits one booking id so an
/// update never conflicts with its own prior version.
pub(crate) fn find_conflicts(
    cs: &ClassroomState,
    candidate: &TimeRange,
    exclude: Option<Ulid>,
) -> Vec<Booking> {
    cs.overlapping(candidate)
        .filter(|b| exclude != Some(b.id))
        .filter(|b| !is_finished(b.status))
        .cloned()
        .collect()
}

pub(crate) fn check_no_conflict(
    cs: &ClassroomState,
    candidate: &TimeRange,
    exclude: Option<Ulid>,
) -> Result<(), EngineError> {
    let conflicts = find_conflicts(cs, candidate, exclude);
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Conflict(conflicts))
    }
}
