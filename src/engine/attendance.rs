use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use crate::limits::{MAX_EVENTS_PER_ENROLLMENT, MAX_REASON_LEN};
use crate::model::*;
use crate::observability;
use crate::verify::Verification;

use super::anomaly::detect_anomalies;
use super::error::RejectReason;
use super::stats::summarize;
use super::utilization::round2;
use super::{Engine, EngineError};

/// Whether a claim of `kind` at `at` is admissible for this enrollment.
/// Sign-in and sign-out are capped at one per UTC calendar day; breaks are
/// not.
pub(crate) fn check_admissible(
    enrollment: &EnrollmentState,
    course: &Course,
    kind: EventKind,
    at: DateTime<Utc>,
) -> Result<(), RejectReason> {
    if !enrollment.is_active(at) {
        return Err(RejectReason::EnrollmentInactive);
    }
    if let Some(course_end) = course.end
        && at > course_end
    {
        return Err(RejectReason::CourseEnded);
    }
    if matches!(kind, EventKind::SignIn | EventKind::SignOut)
        && enrollment.events_on(at.date_naive()).any(|e| e.kind == kind)
    {
        return Err(RejectReason::DuplicateSameDay(kind));
    }
    Ok(())
}

impl Engine {
    /// Would a claim be admissible right now (or at `at`)? Pure read.
    pub async fn validate_attendance(
        &self,
        enrollment_id: Ulid,
        kind: EventKind,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        let at = at.unwrap_or_else(|| self.now());
        let es = self
            .get_enrollment(&enrollment_id)
            .ok_or(EngineError::EnrollmentNotFound(enrollment_id))?;
        let guard = es.read().await;
        let course = self
            .get_course(&guard.course_id)
            .ok_or(EngineError::CourseNotFound(guard.course_id))?;
        check_admissible(&guard, &course, kind, at).map_err(EngineError::AttendanceRejected)
    }

    /// Primary recording path: validate and append with outcome SUCCESS.
    pub async fn record_attendance(
        &self,
        enrollment_id: Ulid,
        kind: EventKind,
        method: CaptureMethod,
        at: Option<DateTime<Utc>>,
    ) -> Result<AttendanceEvent, EngineError> {
        self.record_checked(enrollment_id, kind, method, at, Verification::success(), None, None, None)
            .await
    }

    /// Device-capture path: the verifier's outcome is attached to the event
    /// and the event is persisted even when verification failed — a failed
    /// capture is a legitimate audit record, not an error.
    pub async fn record_verified(
        &self,
        enrollment_id: Ulid,
        kind: EventKind,
        method: CaptureMethod,
        device: Option<String>,
        location: Option<String>,
        payload: serde_json::Value,
    ) -> Result<AttendanceEvent, EngineError> {
        if !self.verifier.supports(method) {
            return Err(EngineError::UnsupportedMethod(method));
        }
        let verification = self.verifier.verify(device.as_deref(), &payload);
        self.record_checked(
            enrollment_id,
            kind,
            method,
            None,
            verification,
            Some(payload),
            device,
            location,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_checked(
        &self,
        enrollment_id: Ulid,
        kind: EventKind,
        method: CaptureMethod,
        at: Option<DateTime<Utc>>,
        verification: Verification,
        payload: Option<serde_json::Value>,
        device: Option<String>,
        location: Option<String>,
    ) -> Result<AttendanceEvent, EngineError> {
        let at = at.unwrap_or_else(|| self.now());
        let es = self
            .get_enrollment(&enrollment_id)
            .ok_or(EngineError::EnrollmentNotFound(enrollment_id))?;
        // Validation and append under one write lock: no other writer can
        // slip a same-day duplicate in between.
        let mut guard = es.write().await;
        if guard.events.len() >= MAX_EVENTS_PER_ENROLLMENT {
            return Err(EngineError::LimitExceeded("too many events on enrollment"));
        }
        let course = self
            .get_course(&guard.course_id)
            .ok_or(EngineError::CourseNotFound(guard.course_id))?;
        if let Err(reason) = check_admissible(&guard, &course, kind, at) {
            metrics::counter!(observability::ATTENDANCE_REJECTED_TOTAL).increment(1);
            return Err(EngineError::AttendanceRejected(reason));
        }

        let event = AttendanceEvent {
            id: Ulid::new(),
            enrollment_id,
            kind,
            method,
            at,
            outcome: verification.outcome,
            valid: verification.success,
            payload,
            device,
            location,
            remark: verification.message,
        };
        guard.insert_event(event.clone());
        metrics::counter!(observability::ATTENDANCE_RECORDED_TOTAL).increment(1);
        Ok(event)
    }

    /// Backdated correction for missed attendance. Bypasses the same-day
    /// cap and the activity window; only the enrollment's existence is
    /// required. Outcome is forced to SUCCESS and the reason is kept in the
    /// event remark.
    pub async fn record_makeup(
        &self,
        enrollment_id: Ulid,
        kind: EventKind,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<AttendanceEvent, EngineError> {
        if reason.len() > MAX_REASON_LEN {
            return Err(EngineError::LimitExceeded("reason too long"));
        }
        let es = self
            .get_enrollment(&enrollment_id)
            .ok_or(EngineError::EnrollmentNotFound(enrollment_id))?;
        let mut guard = es.write().await;
        if guard.events.len() >= MAX_EVENTS_PER_ENROLLMENT {
            return Err(EngineError::LimitExceeded("too many events on enrollment"));
        }

        let event = AttendanceEvent {
            id: Ulid::new(),
            enrollment_id,
            kind,
            method: CaptureMethod::Manual,
            at,
            outcome: VerificationOutcome::Success,
            valid: true,
            payload: None,
            device: None,
            location: None,
            remark: Some(format!("make-up: {reason}")),
        };
        guard.insert_event(event.clone());
        metrics::counter!(observability::ATTENDANCE_RECORDED_TOTAL).increment(1);
        Ok(event)
    }

    // ── Read-side analyses ───────────────────────────────────

    /// Anomalies in one calendar day's events. Default day = today per the
    /// injected clock.
    pub async fn detect_enrollment_anomalies(
        &self,
        enrollment_id: Ulid,
        day: Option<NaiveDate>,
    ) -> Result<Vec<Anomaly>, EngineError> {
        let day = day.unwrap_or_else(|| self.now().date_naive());
        let es = self
            .get_enrollment(&enrollment_id)
            .ok_or(EngineError::EnrollmentNotFound(enrollment_id))?;
        let guard = es.read().await;
        let day_events: Vec<AttendanceEvent> = guard.events_on(day).cloned().collect();
        Ok(detect_anomalies(&day_events))
    }

    /// Per-enrollment tallies over all events, rated against the course's
    /// day span.
    pub async fn enrollment_summary(
        &self,
        enrollment_id: Ulid,
    ) -> Result<AttendanceSummary, EngineError> {
        let es = self
            .get_enrollment(&enrollment_id)
            .ok_or(EngineError::EnrollmentNotFound(enrollment_id))?;
        let guard = es.read().await;
        let course = self
            .get_course(&guard.course_id)
            .ok_or(EngineError::CourseNotFound(guard.course_id))?;
        Ok(summarize(
            enrollment_id,
            &guard.events,
            course_day_span(&course),
        ))
    }

    /// Per-enrollment summaries plus course-level rollups. When both `from`
    /// and `to` are given, events are filtered to that window and it
    /// replaces the course span as the rate denominator.
    pub async fn course_report(
        &self,
        course_id: Ulid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<CourseReport, EngineError> {
        let course = self
            .get_course(&course_id)
            .ok_or(EngineError::CourseNotFound(course_id))?;
        let rate_span = match (from, to) {
            (Some(f), Some(t)) => Some((f, t)),
            _ => course_day_span(&course),
        };

        let mut report = CourseReport::default();
        for enrollment_id in self.enrollments_for_course(&course_id) {
            let Some(es) = self.get_enrollment(&enrollment_id) else {
                continue;
            };
            let guard = es.read().await;
            let events: Vec<AttendanceEvent> = guard
                .events
                .iter()
                .filter(|e| {
                    let day = e.at.date_naive();
                    from.is_none_or(|f| day >= f) && to.is_none_or(|t| day <= t)
                })
                .cloned()
                .collect();
            let summary = summarize(enrollment_id, &events, rate_span);
            report.total_students += 1;
            report.total_attendance_records += summary.total_records;
            report.enrollments.push(summary);
        }

        if report.total_students > 0 {
            let sum: f64 = report
                .enrollments
                .iter()
                .map(|s| s.attendance_rate)
                .sum();
            report.average_attendance_rate = round2(sum / report.total_students as f64);
        }
        Ok(report)
    }
}

/// A course's inclusive day span, or None while its end is undefined.
fn course_day_span(course: &Course) -> Option<(NaiveDate, NaiveDate)> {
    course
        .end
        .map(|end| (course.start.date_naive(), end.date_naive()))
}
