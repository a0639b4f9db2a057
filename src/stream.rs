//! Ownership and lifecycle of the one active media stream.

use crate::check_invariant;
use crate::devices::{release_stream, MediaDevices};
use crate::errors::CameraError;
use crate::types::{FacingMode, MediaConstraints, MediaStream, ZoomRange};
use crate::zoom::{self, ZoomPolicy, DEFAULT_ZOOM};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Closed,
    Opening,
    Open,
}

/// Sole owner of the active [`MediaStream`].
///
/// All mutating operations take `&mut self`, so an open can never overlap a
/// close or another open on the same manager. The stream is closed when the
/// manager is dropped.
pub struct StreamManager {
    devices: Arc<dyn MediaDevices>,
    state: StreamState,
    stream: Option<MediaStream>,
    facing: Option<FacingMode>,
    zoom: f64,
    zoom_range: Option<ZoomRange>,
}

/// Holds the manager in `Opening` while the device is awaited.
///
/// Unless [`keep`](Self::keep) is called, the state falls back to `Closed`
/// when the guard goes away, which also covers a cancelled open.
struct OpeningGuard<'a> {
    state: &'a mut StreamState,
    armed: bool,
}

impl<'a> OpeningGuard<'a> {
    fn enter(state: &'a mut StreamState) -> Self {
        *state = StreamState::Opening;
        Self { state, armed: true }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state = StreamState::Closed;
        }
    }
}

impl StreamManager {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            state: StreamState::Closed,
            stream: None,
            facing: None,
            zoom: DEFAULT_ZOOM,
            zoom_range: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == StreamState::Open
    }

    pub fn stream(&self) -> Option<&MediaStream> {
        self.stream.as_ref()
    }

    /// Facing mode of the open stream.
    pub fn facing_mode(&self) -> Option<FacingMode> {
        self.facing
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_range(&self) -> Option<ZoomRange> {
        self.zoom_range
    }

    /// Open a stream for `facing`.
    ///
    /// `constraints` is the probe result for that mode; `None` means the
    /// mode is unsupported and the call fails without touching the device.
    pub async fn open(
        &mut self,
        facing: FacingMode,
        constraints: Option<&MediaConstraints>,
    ) -> Result<(), CameraError> {
        if self.state != StreamState::Closed {
            return Err(CameraError::Unavailable(format!(
                "cannot open {} camera while stream is {:?}",
                facing, self.state
            )));
        }
        let constraints = constraints.ok_or_else(|| {
            CameraError::Unavailable(format!("{} camera is not supported", facing))
        })?;
        if constraints.facing_mode != facing {
            return Err(CameraError::Unavailable(format!(
                "constraints target {} camera, not {}",
                constraints.facing_mode, facing
            )));
        }

        log::info!("Opening {} camera stream", facing);
        let devices = self.devices.clone();
        let opening = OpeningGuard::enter(&mut self.state);

        let stream = match devices.request_stream(constraints).await {
            Ok(stream) => {
                opening.keep();
                stream
            }
            Err(failure) => {
                drop(opening);
                log::warn!("Failed to open {} camera: {}", facing, failure);
                return Err(failure.into());
            }
        };

        if stream.first_video_track().is_none() {
            release_stream(self.devices.as_ref(), stream);
            self.state = StreamState::Closed;
            return Err(CameraError::Unavailable(format!(
                "{} camera returned no video track",
                facing
            )));
        }

        check_invariant!(
            self.stream.is_none(),
            "at most one stream is open at a time",
            "StreamManager::open"
        );

        self.zoom_range = zoom::resolve(self.devices.as_ref(), &stream);
        self.zoom = DEFAULT_ZOOM;
        self.facing = Some(facing);
        log::info!(
            "Opened {} camera stream {} (zoom range: {:?})",
            facing,
            stream.id(),
            self.zoom_range
        );
        self.stream = Some(stream);
        self.state = StreamState::Open;
        Ok(())
    }

    /// Stop every track of the active stream. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            log::info!("Closing camera stream {}", stream.id());
            release_stream(self.devices.as_ref(), stream);
        }
        self.state = StreamState::Closed;
        self.facing = None;
        self.zoom = DEFAULT_ZOOM;
        self.zoom_range = None;
    }

    /// Close the current stream, then open `facing`.
    ///
    /// If the open fails the manager stays closed; the old stream is never
    /// kept around.
    pub async fn swap_facing_mode(
        &mut self,
        facing: FacingMode,
        constraints: Option<&MediaConstraints>,
    ) -> Result<(), CameraError> {
        self.close();
        check_invariant!(
            self.stream.is_none() && self.zoom_range.is_none(),
            "swap drops the previous stream and zoom range before opening",
            "StreamManager::swap_facing_mode"
        );
        self.open(facing, constraints).await
    }

    /// Apply `value` to the active track and return the zoom now in effect.
    pub async fn apply_zoom(&mut self, value: f64, policy: ZoomPolicy) -> Result<f64, CameraError> {
        let stream = match (&self.state, &self.stream) {
            (StreamState::Open, Some(stream)) => stream,
            _ => return Err(CameraError::Unavailable("no active stream".to_string())),
        };
        let range = self.zoom_range.ok_or_else(|| {
            CameraError::Constraint("zoom is not supported by the active camera".to_string())
        })?;
        if !value.is_finite() {
            return Err(CameraError::Constraint(format!("zoom {} is not a number", value)));
        }

        let target = if range.contains(value) {
            value
        } else {
            match policy {
                ZoomPolicy::Reject => {
                    return Err(CameraError::Constraint(format!(
                        "zoom {} outside [{}, {}]",
                        value, range.min, range.max
                    )))
                }
                ZoomPolicy::Clamp => range.clamp(value),
            }
        };

        let track = stream
            .first_video_track()
            .ok_or_else(|| CameraError::Unavailable("stream has no video track".to_string()))?;
        self.devices
            .apply_zoom(track, target)
            .await
            .map_err(|failure| {
                CameraError::Constraint(format!("device rejected zoom {}: {}", target, failure))
            })?;

        log::debug!("Zoom set to {}", target);
        self.zoom = target;
        Ok(target)
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.close();
    }
}
