//! Operational limits. Everything here surfaces as `EngineError::LimitExceeded`.

/// Max classroom name / teacher identifier length in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Max booking content length in bytes.
pub const MAX_CONTENT_LEN: usize = 4096;

/// Max status-change / make-up reason length in bytes.
pub const MAX_REASON_LEN: usize = 1024;

/// Max bookings held by a single classroom (cancelled ones included —
/// bookings are never physically deleted).
pub const MAX_BOOKINGS_PER_CLASSROOM: usize = 100_000;

/// Max attendance events per enrollment.
pub const MAX_EVENTS_PER_ENROLLMENT: usize = 100_000;

/// Max requests accepted by one batch-create call.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Max duration of a single booking, in hours.
pub const MAX_BOOKING_HOURS: i64 = 24 * 14;

/// Max width of a calendar / utilization query window, in days.
pub const MAX_QUERY_WINDOW_DAYS: i64 = 366 * 2;
