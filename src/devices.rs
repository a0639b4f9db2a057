//! Boundary to the platform's media device layer.
//!
//! Mirrors the browser surface this crate was built against:
//! `getUserMedia`, `MediaStreamTrack.getCapabilities()`,
//! `applyConstraints({ advanced: [{ zoom }] })`, `track.stop()` and a
//! one-frame grab from the preview element.

use crate::errors::DeviceFailure;
use crate::types::{MediaConstraints, MediaStream, MediaTrack, TrackCapabilities, VideoFrame};
use async_trait::async_trait;

#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a live stream matching `constraints`.
    ///
    /// May suspend indefinitely while a permission prompt is open.
    async fn request_stream(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, DeviceFailure>;

    /// Capability descriptor of `track`.
    fn capabilities(&self, track: &MediaTrack) -> TrackCapabilities;

    /// Apply a zoom value to a video track.
    async fn apply_zoom(&self, track: &MediaTrack, zoom: f64) -> Result<(), DeviceFailure>;

    /// Stop a track and release its hardware.
    fn stop_track(&self, track: &MediaTrack);

    /// Most recent frame of a video track, or `None` if it has not
    /// produced data yet.
    fn grab_frame(&self, track: &MediaTrack) -> Option<VideoFrame>;
}

/// Hook run once before probing so platforms that couple permissions
/// (camera plus location) show a single combined prompt.
#[async_trait]
pub trait PermissionPrimer: Send + Sync {
    async fn prime(&self);
}

/// Primer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPrimer;

#[async_trait]
impl PermissionPrimer for NoopPrimer {
    async fn prime(&self) {}
}

/// Stop every track of `stream`, consuming it.
pub(crate) fn release_stream(devices: &dyn MediaDevices, stream: MediaStream) {
    for track in stream.tracks() {
        devices.stop_track(track);
    }
}
