#[cfg(test)]
mod error_tests {
    use crabsnap::errors::{CameraError, DeviceFailure};
    use std::error::Error;

    #[test]
    fn test_camera_error_unavailable() {
        let error = CameraError::Unavailable("front camera is not supported".to_string());
        assert_eq!(
            error.to_string(),
            "Camera unavailable: front camera is not supported"
        );
    }

    #[test]
    fn test_camera_error_constraint() {
        let error = CameraError::Constraint("zoom 12 outside [1, 10]".to_string());
        assert!(error.to_string().contains("Constraint rejected"));
        assert!(error.to_string().contains("zoom 12"));
    }

    #[test]
    fn test_camera_error_debug_format() {
        let error = CameraError::Capture("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Capture"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_device_failure_maps_to_unavailable() {
        for failure in [
            DeviceFailure::Denied,
            DeviceFailure::NotFound,
            DeviceFailure::Overconstrained,
            DeviceFailure::Hardware("device busy".to_string()),
        ] {
            let message = failure.to_string();
            let error: CameraError = failure.into();
            assert_eq!(error, CameraError::Unavailable(message));
        }
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            CameraError::Unavailable("unavailable".to_string()),
            CameraError::Constraint("constraint".to_string()),
            CameraError::Capture("capture".to_string()),
            CameraError::NoCamera,
            CameraError::Busy,
            CameraError::InvalidState("state".to_string()),
            CameraError::Config("config".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            let _error_trait: &dyn Error = &error;
            assert!(error.source().is_none());
        }
    }
}
