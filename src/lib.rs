//! Temporal integrity engine for classroom training operations: booking
//! conflict prevention and lifecycle on the schedule side, attendance
//! validation and read-side analysis on the attendance side. All state is
//! in-memory; callers own persistence.

pub mod clock;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod verify;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineError, RejectReason};
pub use verify::{CapabilityVerifier, ManualVerifier, Verification};
