use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "TimeRange start must be before end");
        Self { start, end }
    }

    /// Fractional hours, e.g. a 90-minute booking is 1.5.
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// What a booking reserves the room for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCategory {
    Regular,
    Makeup,
    Exam,
    Meeting,
    Practice,
    Lecture,
}

/// Booking lifecycle states. Transition rules live in `engine::lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
    Suspended,
    Postponed,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Suspended => "suspended",
            BookingStatus::Postponed => "postponed",
        };
        f.write_str(s)
    }
}

/// One entry of a booking's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub at: DateTime<Utc>,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub reason: Option<String>,
}

/// One reserved time interval on a classroom. Never physically deleted;
/// cancellation is a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub classroom_id: Ulid,
    pub teacher: String,
    pub category: BookingCategory,
    pub range: TimeRange,
    pub status: BookingStatus,
    pub content: Option<String>,
    pub expected_headcount: Option<u32>,
    pub actual_headcount: Option<u32>,
    pub history: Vec<StatusChange>,
}

#[derive(Debug, Clone)]
pub struct ClassroomState {
    pub id: Ulid,
    pub name: Option<String>,
    pub capacity: u32,
    /// Capture methods the room's hardware supports.
    pub devices: Vec<CaptureMethod>,
    /// All bookings, sorted by `range.start`.
    pub bookings: Vec<Booking>,
}

impl ClassroomState {
    pub fn new(id: Ulid, name: Option<String>, capacity: u32, devices: Vec<CaptureMethod>) -> Self {
        Self {
            id,
            name,
            capacity,
            devices,
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by range.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.range.start, |b| b.range.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Take a booking out of the sorted list (used by postpone before
    /// re-inserting with the rewritten range).
    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    /// Return only bookings whose range overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &TimeRange) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.range.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.range.end > query.start)
    }
}

/// Attendance action being claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    SignIn,
    SignOut,
    BreakOut,
    BreakIn,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::SignIn => "sign_in",
            EventKind::SignOut => "sign_out",
            EventKind::BreakOut => "break_out",
            EventKind::BreakIn => "break_in",
        };
        f.write_str(s)
    }
}

/// How the claim was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMethod {
    Face,
    Fingerprint,
    Card,
    QrCode,
    Manual,
    Mobile,
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CaptureMethod::Face => "face",
            CaptureMethod::Fingerprint => "fingerprint",
            CaptureMethod::Card => "card",
            CaptureMethod::QrCode => "qr_code",
            CaptureMethod::Manual => "manual",
            CaptureMethod::Mobile => "mobile",
        };
        f.write_str(s)
    }
}

/// What the capture device reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Success,
    Failed,
    Pending,
    Timeout,
    Error,
    DeviceError,
}

/// One timestamped presence claim. Append-only audit trail: never mutated,
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: Ulid,
    pub enrollment_id: Ulid,
    pub kind: EventKind,
    pub method: CaptureMethod,
    pub at: DateTime<Utc>,
    pub outcome: VerificationOutcome,
    pub valid: bool,
    /// Raw capture payload, opaque to the engine.
    pub payload: Option<serde_json::Value>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub remark: Option<String>,
}

impl AttendanceEvent {
    pub fn is_successful(&self) -> bool {
        self.outcome == VerificationOutcome::Success && self.valid
    }
}

/// A course a person can be enrolled in. Read-mostly; the engine only
/// consults its time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Ulid,
    pub name: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EnrollmentState {
    pub id: Ulid,
    pub person: String,
    pub course_id: Ulid,
    pub classroom_id: Ulid,
    pub begin: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub finished: bool,
    /// All attendance events, sorted by `at`.
    pub events: Vec<AttendanceEvent>,
}

impl EnrollmentState {
    pub fn new(
        id: Ulid,
        person: String,
        course_id: Ulid,
        classroom_id: Ulid,
        begin: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            person,
            course_id,
            classroom_id,
            begin,
            end,
            finished: false,
            events: Vec::new(),
        }
    }

    /// Active = not finished, begun, and not past the enrollment end.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.finished && now >= self.begin && self.end.is_none_or(|e| now <= e)
    }

    /// Insert event maintaining sort order by timestamp.
    pub fn insert_event(&mut self, event: AttendanceEvent) {
        let pos = self
            .events
            .binary_search_by_key(&event.at, |e| e.at)
            .unwrap_or_else(|e| e);
        self.events.insert(pos, event);
    }

    /// Events falling on the given UTC calendar day.
    pub fn events_on(&self, day: NaiveDate) -> impl Iterator<Item = &AttendanceEvent> {
        self.events.iter().filter(move |e| e.at.date_naive() == day)
    }
}

// ── Request / report types ───────────────────────────────────────

/// One item of a (single or batch) booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub classroom_id: Ulid,
    pub teacher: String,
    pub category: BookingCategory,
    pub range: TimeRange,
    pub content: Option<String>,
    pub expected_headcount: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub index: usize,
    pub request: BookingRequest,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UtilizationStats {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub cancelled_sessions: usize,
    pub total_hours: f64,
    pub available_hours: f64,
    /// Percent of available hours booked, 2 decimals.
    pub utilization_rate: f64,
    /// Percent of sessions completed, 2 decimals.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    MultipleSignIn,
    MultipleSignOut,
    SignOutWithoutSignIn,
    SignOutBeforeSignIn,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyKind::MultipleSignIn => "multiple_sign_in",
            AnomalyKind::MultipleSignOut => "multiple_sign_out",
            AnomalyKind::SignOutWithoutSignIn => "sign_out_without_sign_in",
            AnomalyKind::SignOutBeforeSignIn => "sign_out_before_sign_in",
        };
        f.write_str(s)
    }
}

/// A logically inconsistent same-day event pattern, with the events that
/// triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub events: Vec<AttendanceEvent>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttendanceSummary {
    pub enrollment_id: Option<Ulid>,
    pub total_records: usize,
    pub sign_in_count: usize,
    pub sign_out_count: usize,
    pub break_out_count: usize,
    pub break_in_count: usize,
    pub unique_days_attended: usize,
    /// Percent of course days with at least one event, 2 decimals.
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourseReport {
    pub total_students: usize,
    pub total_attendance_records: usize,
    /// Arithmetic mean of per-enrollment rates, 2 decimals.
    pub average_attendance_rate: f64,
    pub enrollments: Vec<AttendanceSummary>,
}
