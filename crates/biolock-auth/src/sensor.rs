use std::{collections::VecDeque, sync::Mutex};

use tokio::sync::oneshot;

/// What the platform's sensor service reports before a challenge starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    NoHardware,
    HardwareUnavailable,
    NoneEnrolled,
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::NoHardware => write!(f, "no biometric hardware"),
            Availability::HardwareUnavailable => write!(f, "hardware unavailable"),
            Availability::NoneEnrolled => write!(f, "no biometrics enrolled"),
        }
    }
}

/// Text shown on the platform authentication dialog.
///
/// Stands in for the original sample's string resources; the CLI config can
/// override each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub negative_button: String,
    /// When false the platform may resolve without an explicit confirm tap.
    pub confirmation_required: bool,
}

impl PromptSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            description: None,
            negative_button: "Cancel".to_string(),
            confirmation_required: false,
        }
    }
}

/// Error codes a sensor can report for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorErrorCode {
    /// The caller or the user dismissed the pending challenge.
    Canceled,
    /// The platform dialog timed out.
    Timeout,
    /// Too many failed attempts; the sensor refuses further challenges for
    /// now.
    Lockout,
    /// The key was permanently invalidated (e.g. biometric re-enrollment).
    KeyInvalidated,
    /// The sensor stopped responding mid-challenge.
    HardwareError,
}

impl SensorErrorCode {
    /// True when retrying the same challenge can never succeed and the key
    /// must be recreated first. Recovering the old data is unsupported.
    pub fn requires_key_reset(self) -> bool {
        matches!(self, SensorErrorCode::KeyInvalidated)
    }
}

/// The single resolution of one challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorReply {
    /// The user matched; the bound cipher may be authorized.
    Success,
    /// Wrong biometric. Transient; the caller may re-prompt.
    Failure { reason: String },
    /// Challenge-level error. See [`SensorErrorCode::requires_key_reset`].
    Error {
        code: SensorErrorCode,
        message: String,
    },
}

/// Capability interface over the platform biometric service.
///
/// `authenticate` is the fires-once callback of the platform API: the
/// implementation must resolve `reply` exactly once, at its own pace.
/// Dropping the sender unresolved is reported to the caller as a hardware
/// error.
pub trait BiometricSensor: Send + Sync {
    fn check_availability(&self) -> Availability;

    fn authenticate(&self, prompt: &PromptSpec, reply: oneshot::Sender<SensorReply>);
}

/// Sensor double that reports available and approves every challenge.
/// Useful for smoke runs on targets without a platform integration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApprovingSensor;

impl BiometricSensor for ApprovingSensor {
    fn check_availability(&self) -> Availability {
        Availability::Available
    }

    fn authenticate(&self, _prompt: &PromptSpec, reply: oneshot::Sender<SensorReply>) {
        let _ = reply.send(SensorReply::Success);
    }
}

/// Sensor double that accepts challenges but never resolves them, keeping
/// the reply channel open. For exercising cancellation paths.
#[derive(Debug, Default)]
pub struct SilentSensor {
    parked: Mutex<Vec<oneshot::Sender<SensorReply>>>,
}

impl SilentSensor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BiometricSensor for SilentSensor {
    fn check_availability(&self) -> Availability {
        Availability::Available
    }

    fn authenticate(&self, _prompt: &PromptSpec, reply: oneshot::Sender<SensorReply>) {
        if let Ok(mut parked) = self.parked.lock() {
            parked.push(reply);
        }
    }
}

/// Scripted sensor for tests: fixed availability, replies served in order.
/// When the script runs dry the reply channel is dropped unresolved, which
/// exercises the caller's dead-sensor path.
#[derive(Debug)]
pub struct ScriptedSensor {
    availability: Availability,
    replies: Mutex<VecDeque<SensorReply>>,
}

impl ScriptedSensor {
    pub fn new(availability: Availability) -> Self {
        Self {
            availability,
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_reply(&self, reply: SensorReply) {
        if let Ok(mut script) = self.replies.lock() {
            script.push_back(reply);
        }
    }
}

impl BiometricSensor for ScriptedSensor {
    fn check_availability(&self) -> Availability {
        self.availability
    }

    fn authenticate(&self, _prompt: &PromptSpec, reply: oneshot::Sender<SensorReply>) {
        let next = self.replies.lock().ok().and_then(|mut script| script.pop_front());
        if let Some(scripted) = next {
            let _ = reply.send(scripted);
        }
        // No scripted reply: drop the sender, simulating a dead sensor.
    }
}
