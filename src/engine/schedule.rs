use std::collections::BTreeMap;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::conflict::{check_no_conflict, find_conflicts, validate_range};
use super::lifecycle::{is_editable, record_transition};
use super::utilization::utilization;
use super::{Engine, EngineError};

impl Engine {
    /// Conflict-check and insert under one classroom write lock.
    pub async fn create_booking(&self, req: &BookingRequest) -> Result<Booking, EngineError> {
        validate_range(&req.range)?;
        if req.teacher.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("teacher identifier too long"));
        }
        if let Some(ref c) = req.content
            && c.len() > MAX_CONTENT_LEN
        {
            return Err(EngineError::LimitExceeded("booking content too long"));
        }
        let cs = self
            .get_classroom(&req.classroom_id)
            .ok_or(EngineError::ClassroomNotFound(req.classroom_id))?;
        let mut guard = cs.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_CLASSROOM {
            return Err(EngineError::LimitExceeded("too many bookings on classroom"));
        }

        let conflicts = find_conflicts(&guard, &req.range, None);
        if !conflicts.is_empty() {
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Conflict(conflicts));
        }

        let booking = Booking {
            id: Ulid::new(),
            classroom_id: req.classroom_id,
            teacher: req.teacher.clone(),
            category: req.category,
            range: req.range,
            status: BookingStatus::Scheduled,
            content: req.content.clone(),
            expected_headcount: req.expected_headcount,
            actual_headcount: None,
            history: Vec::new(),
        };
        guard.insert_booking(booking.clone());
        self.index_booking(booking.id, req.classroom_id);
        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(booking)
    }

    /// Bookings on the classroom overlapping `range`, finished ones
    /// excluded. Pure read.
    pub async fn find_conflicts(
        &self,
        classroom_id: Ulid,
        range: TimeRange,
        exclude_booking_id: Option<Ulid>,
    ) -> Result<Vec<Booking>, EngineError> {
        validate_range(&range)?;
        let cs = self
            .get_classroom(&classroom_id)
            .ok_or(EngineError::ClassroomNotFound(classroom_id))?;
        let guard = cs.read().await;
        Ok(find_conflicts(&guard, &range, exclude_booking_id))
    }

    /// Apply a status transition and append the audit entry. No transition
    /// is blocked here; callers enforce their own pre-conditions.
    pub async fn change_status(
        &self,
        booking_id: Ulid,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, EngineError> {
        if let Some(ref r) = reason
            && r.len() > MAX_REASON_LEN
        {
            return Err(EngineError::LimitExceeded("reason too long"));
        }
        let (_, mut guard) = self.resolve_booking_write(&booking_id).await?;
        let now = self.now();
        let booking = guard
            .booking_mut(booking_id)
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        record_transition(booking, to, reason, now);
        metrics::counter!(observability::STATUS_CHANGES_TOTAL).increment(1);
        Ok(booking.clone())
    }

    /// Cancellation is always permitted, whatever the current status.
    pub async fn cancel(
        &self,
        booking_id: Ulid,
        reason: impl Into<String>,
    ) -> Result<Booking, EngineError> {
        self.change_status(booking_id, BookingStatus::Cancelled, Some(reason.into()))
            .await
    }

    /// Rewrite the booking's range after a conflict check that excludes its
    /// own id, keeping the original range in the audit entry.
    pub async fn postpone(
        &self,
        booking_id: Ulid,
        new_range: TimeRange,
        reason: impl Into<String>,
    ) -> Result<Booking, EngineError> {
        validate_range(&new_range)?;
        let reason = reason.into();
        if reason.len() > MAX_REASON_LEN {
            return Err(EngineError::LimitExceeded("reason too long"));
        }
        let (_, mut guard) = self.resolve_booking_write(&booking_id).await?;

        if let Err(e) = check_no_conflict(&guard, &new_range, Some(booking_id)) {
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        // Remove and re-insert so the list stays sorted by start.
        let mut booking = guard
            .remove_booking(booking_id)
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        let original = booking.range;
        let note = format!(
            "moved from [{}, {}): {reason}",
            original.start, original.end
        );
        record_transition(&mut booking, BookingStatus::Postponed, Some(note), self.now());
        booking.range = new_range;
        guard.insert_booking(booking.clone());
        metrics::counter!(observability::STATUS_CHANGES_TOTAL).increment(1);
        Ok(booking)
    }

    /// Advisory only — `cancel` does not consult it.
    pub async fn can_be_cancelled(&self, booking_id: Ulid) -> Result<bool, EngineError> {
        let classroom_id = self
            .classroom_for_booking(&booking_id)
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        let cs = self
            .get_classroom(&classroom_id)
            .ok_or(EngineError::ClassroomNotFound(classroom_id))?;
        let guard = cs.read().await;
        let booking = guard
            .booking(booking_id)
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        Ok(is_editable(booking.status) && booking.range.start > self.now())
    }

    /// Apply the requests strictly in input order. Sequential on purpose:
    /// each accepted booking must be visible to the conflict checks of later
    /// items, so one batch can never admit mutually-conflicting entries.
    /// Per-item failures never abort the rest, and already-created bookings
    /// stay committed.
    pub async fn create_batch(
        &self,
        requests: &[BookingRequest],
        skip_conflicts: bool,
    ) -> Result<BatchReport, EngineError> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(EngineError::LimitExceeded("batch too large"));
        }
        metrics::histogram!(observability::BATCH_SIZE).record(requests.len() as f64);

        let mut report = BatchReport::default();
        for (index, req) in requests.iter().enumerate() {
            match self.create_booking(req).await {
                Ok(_) => report.succeeded += 1,
                Err(EngineError::Conflict(_)) if skip_conflicts => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    report.failures.push(BatchFailure {
                        index,
                        request: req.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::debug!(
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "batch create finished"
        );
        Ok(report)
    }

    /// Bookings starting within the inclusive day window, grouped by day.
    pub async fn calendar(
        &self,
        classroom_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<Booking>>, EngineError> {
        if (to - from).num_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }
        let cs = self
            .get_classroom(&classroom_id)
            .ok_or(EngineError::ClassroomNotFound(classroom_id))?;
        let guard = cs.read().await;

        let mut days: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
        for booking in &guard.bookings {
            let day = booking.range.start.date_naive();
            if day >= from && day <= to {
                days.entry(day).or_default().push(booking.clone());
            }
        }
        Ok(days)
    }

    /// Utilization of one classroom over an inclusive day window, computed
    /// over bookings starting within it.
    pub async fn classroom_utilization(
        &self,
        classroom_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<UtilizationStats, EngineError> {
        if (to - from).num_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }
        let cs = self
            .get_classroom(&classroom_id)
            .ok_or(EngineError::ClassroomNotFound(classroom_id))?;
        let guard = cs.read().await;

        let bookings: Vec<Booking> = guard
            .bookings
            .iter()
            .filter(|b| {
                let day = b.range.start.date_naive();
                day >= from && day <= to
            })
            .cloned()
            .collect();
        Ok(utilization(&bookings, from, to))
    }
}
