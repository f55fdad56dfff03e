use ulid::Ulid;

use crate::model::{Booking, CaptureMethod, EventKind};

/// Why the attendance validator declined a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Enrollment is finished or the timestamp falls outside its window.
    EnrollmentInactive,
    /// The course's end time has passed.
    CourseEnded,
    /// A sign-in or sign-out of the same kind already exists that day.
    DuplicateSameDay(EventKind),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EnrollmentInactive => write!(f, "enrollment is not active"),
            RejectReason::CourseEnded => write!(f, "course has ended"),
            RejectReason::DuplicateSameDay(kind) => {
                write!(f, "{kind} already recorded for this calendar day")
            }
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    InvalidRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },
    /// Overlapping bookings found; carries them so callers can display the
    /// collisions.
    Conflict(Vec<Booking>),
    ClassroomNotFound(Ulid),
    BookingNotFound(Ulid),
    CourseNotFound(Ulid),
    EnrollmentNotFound(Ulid),
    AlreadyExists(Ulid),
    AttendanceRejected(RejectReason),
    UnsupportedMethod(CaptureMethod),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid range: start {start} not before end {end}")
            }
            EngineError::Conflict(bookings) => {
                write!(f, "conflicts with {} booking(s):", bookings.len())?;
                for b in bookings {
                    write!(f, " {}", b.id)?;
                }
                Ok(())
            }
            EngineError::ClassroomNotFound(id) => write!(f, "classroom not found: {id}"),
            EngineError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::CourseNotFound(id) => write!(f, "course not found: {id}"),
            EngineError::EnrollmentNotFound(id) => write!(f, "enrollment not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::AttendanceRejected(reason) => {
                write!(f, "attendance rejected: {reason}")
            }
            EngineError::UnsupportedMethod(method) => {
                write!(f, "no verifier for capture method: {method}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
