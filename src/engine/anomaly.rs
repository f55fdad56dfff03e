use crate::model::{Anomaly, AnomalyKind, AttendanceEvent, EventKind};

/// Inspect one calendar day's events for logically inconsistent patterns.
/// Rules are independent and non-exclusive: a single day can report several
/// anomalies at once. Read-only; events are never mutated or discarded.
pub fn detect_anomalies(day_events: &[AttendanceEvent]) -> Vec<Anomaly> {
    let sign_ins: Vec<AttendanceEvent> = day_events
        .iter()
        .filter(|e| e.kind == EventKind::SignIn)
        .cloned()
        .collect();
    let sign_outs: Vec<AttendanceEvent> = day_events
        .iter()
        .filter(|e| e.kind == EventKind::SignOut)
        .cloned()
        .collect();

    let mut anomalies = Vec::new();

    if sign_ins.len() > 1 {
        anomalies.push(Anomaly {
            kind: AnomalyKind::MultipleSignIn,
            events: sign_ins.clone(),
        });
    }
    if sign_outs.len() > 1 {
        anomalies.push(Anomaly {
            kind: AnomalyKind::MultipleSignOut,
            events: sign_outs.clone(),
        });
    }
    if !sign_outs.is_empty() && sign_ins.is_empty() {
        anomalies.push(Anomaly {
            kind: AnomalyKind::SignOutWithoutSignIn,
            events: sign_outs.clone(),
        });
    }
    if let (Some(latest_in), Some(earliest_out)) = (
        sign_ins.iter().max_by_key(|e| e.at),
        sign_outs.iter().min_by_key(|e| e.at),
    ) && earliest_out.at < latest_in.at
    {
        anomalies.push(Anomaly {
            kind: AnomalyKind::SignOutBeforeSignIn,
            events: vec![latest_in.clone(), earliest_out.clone()],
        });
    }

    anomalies
}
