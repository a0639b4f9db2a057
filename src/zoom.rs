//! Zoom range negotiation against the active track's capabilities.

use crate::devices::MediaDevices;
use crate::types::{MediaStream, ZoomRange};
use serde::{Deserialize, Serialize};

/// Zoom value every freshly opened stream starts at.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// What to do with a zoom request outside the resolved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomPolicy {
    /// Refuse the request and keep the current zoom.
    Reject,
    /// Apply the nearest in-range value instead.
    Clamp,
}

/// Supported zoom range of the first video track of `stream`.
///
/// `None` means the track cannot zoom. Capability descriptors with
/// non-finite or inverted bounds are treated the same way.
pub fn resolve(devices: &dyn MediaDevices, stream: &MediaStream) -> Option<ZoomRange> {
    let track = stream.first_video_track()?;
    let zoom = devices.capabilities(track).zoom?;

    if !(zoom.min.is_finite() && zoom.max.is_finite() && zoom.step.is_finite()) {
        log::warn!("Ignoring non-finite zoom capability on track {}", track.id);
        return None;
    }
    if zoom.min > zoom.max || zoom.step < 0.0 {
        log::warn!(
            "Ignoring inverted zoom capability [{}, {}] step {} on track {}",
            zoom.min,
            zoom.max,
            zoom.step,
            track.id
        );
        return None;
    }

    Some(ZoomRange {
        min: zoom.min,
        max: zoom.max,
        step: zoom.step,
    })
}
