use std::net::SocketAddr;

// ── Schedule metrics ─────────────────────────────────────────────

/// Counter: bookings created (single and batch paths).
pub const BOOKINGS_CREATED_TOTAL: &str = "classtime_bookings_created_total";

/// Counter: booking requests rejected for overlap.
pub const BOOKING_CONFLICTS_TOTAL: &str = "classtime_booking_conflicts_total";

/// Counter: booking status transitions applied.
pub const STATUS_CHANGES_TOTAL: &str = "classtime_status_changes_total";

/// Histogram: items per batch-create call.
pub const BATCH_SIZE: &str = "classtime_batch_size";

// ── Attendance metrics ───────────────────────────────────────────

/// Counter: attendance events persisted (any outcome).
pub const ATTENDANCE_RECORDED_TOTAL: &str = "classtime_attendance_recorded_total";

/// Counter: attendance claims rejected by validation.
pub const ATTENDANCE_REJECTED_TOTAL: &str = "classtime_attendance_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
