use thiserror::Error;

/// Why the device layer refused a stream request or a track operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceFailure {
    #[error("permission denied")]
    Denied,
    #[error("no matching device")]
    NotFound,
    #[error("constraints cannot be satisfied")]
    Overconstrained,
    #[error("hardware error: {0}")]
    Hardware(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Constraint rejected: {0}")]
    Constraint(String),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("No camera available")]
    NoCamera,
    #[error("Another camera command is in flight")]
    Busy,
    #[error("Invalid session state: {0}")]
    InvalidState(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DeviceFailure> for CameraError {
    fn from(failure: DeviceFailure) -> Self {
        CameraError::Unavailable(failure.to_string())
    }
}
