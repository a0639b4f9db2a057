#[cfg(test)]
mod stream_manager_tests {
    use crabsnap::invariants::{require_checked, reset_checked_invariants};
    use crabsnap::testing::{SyntheticCamera, SyntheticDevices};
    use crabsnap::{
        CameraError, DeviceFailure, FacingMode, MediaConstraints, StreamManager, StreamState,
        ZoomPolicy,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn constraints(facing: FacingMode) -> MediaConstraints {
        MediaConstraints::new(facing, 1280, 720)
    }

    fn manager(devices: &Arc<SyntheticDevices>) -> StreamManager {
        StreamManager::new(devices.clone())
    }

    #[tokio::test]
    async fn test_open_resolves_zoom_and_resets_zoom() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);

        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();

        assert_eq!(streams.state(), StreamState::Open);
        assert_eq!(streams.facing_mode(), Some(FacingMode::Back));
        assert_eq!(streams.zoom(), 1.0);
        let range = streams.zoom_range().unwrap();
        assert_eq!((range.min, range.max), (1.0, 10.0));
        assert_eq!(devices.live_track_count(), 1);
    }

    #[tokio::test]
    async fn test_open_without_constraints_never_touches_device() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);

        let err = streams.open(FacingMode::Front, None).await.unwrap_err();
        assert!(matches!(err, CameraError::Unavailable(_)));
        assert_eq!(streams.state(), StreamState::Closed);
        assert!(devices.requests().is_empty());
    }

    #[tokio::test]
    async fn test_open_rejected_while_open() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();
        let first_id = streams.stream().unwrap().id();

        let err = streams
            .open(FacingMode::Front, Some(&constraints(FacingMode::Front)))
            .await
            .unwrap_err();
        assert!(matches!(err, CameraError::Unavailable(_)));
        assert_eq!(streams.stream().unwrap().id(), first_id);
        assert_eq!(devices.requests_for(FacingMode::Front), 0);
    }

    #[tokio::test]
    async fn test_device_denial_surfaces_unavailable() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        devices.fail_next_open(FacingMode::Back, DeviceFailure::Denied);
        let mut streams = manager(&devices);

        let err = streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap_err();
        assert_eq!(err, CameraError::Unavailable("permission denied".to_string()));
        assert_eq!(streams.state(), StreamState::Closed);
        assert!(streams.stream().is_none());
        assert!(streams.zoom_range().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_stops_each_track_once() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        let audio = constraints(FacingMode::Back).with_audio(true);
        streams.open(FacingMode::Back, Some(&audio)).await.unwrap();
        assert_eq!(streams.stream().unwrap().tracks().len(), 2);

        streams.close();
        streams.close();

        assert_eq!(streams.state(), StreamState::Closed);
        assert_eq!(devices.stopped_tracks().len(), 2);
        assert_eq!(devices.live_track_count(), 0);
        assert_eq!(streams.zoom(), 1.0);
        assert!(streams.zoom_range().is_none());
    }

    #[tokio::test]
    async fn test_swap_replaces_zoom_range() {
        reset_checked_invariants();
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();
        streams.apply_zoom(4.0, ZoomPolicy::Reject).await.unwrap();

        streams
            .swap_facing_mode(FacingMode::Front, Some(&constraints(FacingMode::Front)))
            .await
            .unwrap();

        assert_eq!(streams.facing_mode(), Some(FacingMode::Front));
        assert_eq!(streams.zoom(), 1.0);
        assert_eq!(streams.zoom_range().unwrap().max, 3.0);
        assert_eq!(devices.live_track_count(), 1);
        assert_eq!(devices.stopped_tracks().len(), 1);

        require_checked(
            "stream swap",
            &[
                "at most one stream is open at a time",
                "swap drops the previous stream and zoom range before opening",
            ],
        );
    }

    #[tokio::test]
    async fn test_failed_swap_ends_closed() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();
        devices.fail_next_open(FacingMode::Front, DeviceFailure::Hardware("busy".to_string()));

        let err = streams
            .swap_facing_mode(FacingMode::Front, Some(&constraints(FacingMode::Front)))
            .await
            .unwrap_err();

        assert!(matches!(err, CameraError::Unavailable(_)));
        assert_eq!(streams.state(), StreamState::Closed);
        assert!(streams.stream().is_none());
        assert_eq!(devices.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_zoom_policies() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        streams
            .open(FacingMode::Front, Some(&constraints(FacingMode::Front)))
            .await
            .unwrap();

        assert_eq!(streams.apply_zoom(2.5, ZoomPolicy::Reject).await.unwrap(), 2.5);

        let err = streams.apply_zoom(7.0, ZoomPolicy::Reject).await.unwrap_err();
        assert!(matches!(err, CameraError::Constraint(_)));
        assert_eq!(streams.zoom(), 2.5);

        assert_eq!(streams.apply_zoom(7.0, ZoomPolicy::Clamp).await.unwrap(), 3.0);
        assert_eq!(streams.zoom(), 3.0);

        assert!(streams.apply_zoom(f64::NAN, ZoomPolicy::Clamp).await.is_err());
        assert_eq!(devices.applied_zoom(), vec![2.5, 3.0]);
    }

    #[tokio::test]
    async fn test_apply_zoom_unsupported_or_closed() {
        let devices = Arc::new(
            SyntheticDevices::new().with_camera(SyntheticCamera::new(FacingMode::Back)),
        );
        let mut streams = manager(&devices);

        let err = streams.apply_zoom(1.0, ZoomPolicy::Reject).await.unwrap_err();
        assert!(matches!(err, CameraError::Unavailable(_)));

        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();
        let err = streams.apply_zoom(1.0, ZoomPolicy::Clamp).await.unwrap_err();
        assert!(matches!(err, CameraError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_device_zoom_rejection_keeps_zoom() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        streams
            .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
            .await
            .unwrap();
        devices.set_reject_zoom(true);

        let err = streams.apply_zoom(2.0, ZoomPolicy::Reject).await.unwrap_err();
        assert!(matches!(err, CameraError::Constraint(_)));
        assert_eq!(streams.zoom(), 1.0);
    }

    #[tokio::test]
    async fn test_cancelled_open_falls_back_to_closed() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        let mut streams = manager(&devices);
        let back = constraints(FacingMode::Back);
        devices.pause_opens();

        let cancelled = timeout(
            Duration::from_millis(20),
            streams.open(FacingMode::Back, Some(&back)),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(streams.state(), StreamState::Closed);
        assert!(streams.stream().is_none());

        devices.resume_opens();
        streams.open(FacingMode::Back, Some(&back)).await.unwrap();
        assert_eq!(streams.state(), StreamState::Open);
        assert_eq!(devices.live_track_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_closes_stream() {
        let devices = Arc::new(SyntheticDevices::front_and_back());
        {
            let mut streams = manager(&devices);
            streams
                .open(FacingMode::Back, Some(&constraints(FacingMode::Back)))
                .await
                .unwrap();
            assert_eq!(devices.live_track_count(), 1);
        }
        assert_eq!(devices.live_track_count(), 0);
    }
}
