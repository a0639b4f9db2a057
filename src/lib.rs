//! CrabSnap: camera stream lifecycle and capability negotiation
//!
//! This crate is the decision core of a camera-capture widget. It works out
//! which cameras a device really has, keeps exactly one media stream open
//! across camera switches and teardown, negotiates zoom against the active
//! track's capabilities and turns a shutter press into an encoded photo.
//!
//! # Features
//! - Probe-and-release detection of front/back camera support
//! - Single-owner stream management with safe facing-mode swaps
//! - Zoom range discovery with reject or clamp policies
//! - Mirrored front-camera capture to PNG or JPEG
//! - Serialized session commands with observable state snapshots
//!
//! # Usage
//! ```rust,ignore
//! use crabsnap::{CameraSession, CrabSnapConfig};
//! use std::sync::Arc;
//!
//! let session = CameraSession::new(Arc::new(my_devices), CrabSnapConfig::default())
//!     .with_photo_handler(|photo| println!("took {} bytes", photo.size_bytes()));
//! session.initialize().await?;
//! session.set_zoom(2.0).await?;
//! let photo = session.capture_photo().await?;
//! session.shutdown().await;
//! ```
pub mod capture;
pub mod config;
pub mod devices;
pub mod errors;
pub mod invariants;
pub mod probe;
pub mod session;
pub mod stream;
pub mod types;
pub mod zoom;

// Testing utilities - synthetic devices for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::CrabSnapConfig;
pub use devices::{MediaDevices, NoopPrimer, PermissionPrimer};
pub use errors::{CameraError, DeviceFailure};
pub use probe::ConstraintMap;
pub use session::{CameraSession, SessionPhase, SessionSnapshot};
pub use stream::{StreamManager, StreamState};
pub use types::{FacingMode, MediaConstraints, MediaStream, Photo, PhotoFormat, ZoomRange};
pub use zoom::ZoomPolicy;

/// Initialize logging for the camera session
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabsnap=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabsnap");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging();
        init_logging();
    }
}
