//! Capture-device integration seam. The engine never interprets biometric,
//! card or QR payloads itself; it only records the outcome a verifier
//! reports. A failed verification is a legitimate persisted outcome, not an
//! error path.

use crate::model::{CaptureMethod, VerificationOutcome};

/// What a device integration reported for one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub success: bool,
    pub outcome: VerificationOutcome,
    pub message: Option<String>,
}

impl Verification {
    pub fn success() -> Self {
        Self {
            success: true,
            outcome: VerificationOutcome::Success,
            message: None,
        }
    }

    pub fn failure(outcome: VerificationOutcome, message: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome,
            message: Some(message.into()),
        }
    }
}

pub trait CapabilityVerifier: Send + Sync {
    fn supports(&self, method: CaptureMethod) -> bool;

    fn verify(&self, device: Option<&str>, payload: &serde_json::Value) -> Verification;
}

/// Default verifier: accepts operator-entered captures as-is, supports no
/// hardware methods.
#[derive(Debug, Default)]
pub struct ManualVerifier;

impl CapabilityVerifier for ManualVerifier {
    fn supports(&self, method: CaptureMethod) -> bool {
        matches!(method, CaptureMethod::Manual | CaptureMethod::Mobile)
    }

    fn verify(&self, _device: Option<&str>, _payload: &serde_json::Value) -> Verification {
        Verification::success()
    }
}
