mod anomaly;
mod attendance;
mod conflict;
mod error;
mod lifecycle;
mod schedule;
mod stats;
mod utilization;

pub use anomaly::detect_anomalies;
pub use error::{EngineError, RejectReason};
pub use lifecycle::{is_active, is_editable, is_finished};
pub use stats::summarize;
pub use utilization::utilization;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::clock::{Clock, SystemClock};
use crate::limits::MAX_NAME_LEN;
use crate::model::*;
use crate::verify::{CapabilityVerifier, ManualVerifier};

pub type SharedClassroomState = Arc<RwLock<ClassroomState>>;
pub type SharedEnrollmentState = Arc<RwLock<EnrollmentState>>;

/// The temporal integrity engine: booking conflict prevention and lifecycle
/// on the schedule side, validation and read-side analysis on the
/// attendance side.
///
/// Each classroom and each enrollment sits behind its own `RwLock`; mutating
/// operations hold the write lock across check-then-write, so two concurrent
/// requests can never both pass a conflict or duplicate check and both
/// commit.
pub struct Engine {
    classrooms: DashMap<Ulid, SharedClassroomState>,
    enrollments: DashMap<Ulid, SharedEnrollmentState>,
    courses: DashMap<Ulid, Course>,
    /// Reverse lookup: booking id → classroom id.
    booking_index: DashMap<Ulid, Ulid>,
    /// Course → enrollments index for course-level reports.
    course_index: DashMap<Ulid, Vec<Ulid>>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn CapabilityVerifier>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ManualVerifier))
    }
}

impl Engine {
    pub fn new(clock: Arc<dyn Clock>, verifier: Arc<dyn CapabilityVerifier>) -> Self {
        Self {
            classrooms: DashMap::new(),
            enrollments: DashMap::new(),
            courses: DashMap::new(),
            booking_index: DashMap::new(),
            course_index: DashMap::new(),
            clock,
            verifier,
        }
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Collaborator write paths ─────────────────────────────

    pub fn create_classroom(
        &self,
        id: Ulid,
        name: Option<String>,
        capacity: u32,
        devices: Vec<CaptureMethod>,
    ) -> Result<(), EngineError> {
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("classroom name too long"));
        }
        if self.classrooms.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        let cs = ClassroomState::new(id, name, capacity, devices);
        self.classrooms.insert(id, Arc::new(RwLock::new(cs)));
        Ok(())
    }

    pub fn create_course(
        &self,
        id: Ulid,
        name: Option<String>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        if self.courses.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        self.courses.insert(id, Course { id, name, start, end });
        Ok(())
    }

    pub fn create_enrollment(
        &self,
        id: Ulid,
        person: String,
        course_id: Ulid,
        classroom_id: Ulid,
        begin: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        if person.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("person identifier too long"));
        }
        if self.enrollments.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        if !self.courses.contains_key(&course_id) {
            return Err(EngineError::CourseNotFound(course_id));
        }
        if !self.classrooms.contains_key(&classroom_id) {
            return Err(EngineError::ClassroomNotFound(classroom_id));
        }
        let es = EnrollmentState::new(id, person, course_id, classroom_id, begin, end);
        self.enrollments.insert(id, Arc::new(RwLock::new(es)));
        self.course_index.entry(course_id).or_default().push(id);
        Ok(())
    }

    pub async fn finish_enrollment(&self, id: Ulid) -> Result<(), EngineError> {
        let es = self
            .get_enrollment(&id)
            .ok_or(EngineError::EnrollmentNotFound(id))?;
        let mut guard = es.write().await;
        guard.finished = true;
        Ok(())
    }

    // ── Repository-shaped accessors ──────────────────────────

    pub fn get_classroom(&self, id: &Ulid) -> Option<SharedClassroomState> {
        self.classrooms.get(id).map(|e| e.value().clone())
    }

    pub fn get_enrollment(&self, id: &Ulid) -> Option<SharedEnrollmentState> {
        self.enrollments.get(id).map(|e| e.value().clone())
    }

    pub fn get_course(&self, id: &Ulid) -> Option<Course> {
        self.courses.get(id).map(|e| e.value().clone())
    }

    pub fn classroom_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_index.get(booking_id).map(|e| *e.value())
    }

    pub fn enrollments_for_course(&self, course_id: &Ulid) -> Vec<Ulid> {
        self.course_index
            .get(course_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub(super) fn index_booking(&self, booking_id: Ulid, classroom_id: Ulid) {
        self.booking_index.insert(booking_id, classroom_id);
    }

    /// Lookup booking → classroom, then acquire the classroom write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<ClassroomState>), EngineError> {
        let classroom_id = self
            .classroom_for_booking(booking_id)
            .ok_or(EngineError::BookingNotFound(*booking_id))?;
        let cs = self
            .get_classroom(&classroom_id)
            .ok_or(EngineError::ClassroomNotFound(classroom_id))?;
        let guard = cs.write_owned().await;
        Ok((classroom_id, guard))
    }
}
