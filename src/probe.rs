//! Facing-mode support detection.
//!
//! The only portable way to learn whether a device has a front or back
//! camera is to ask for one: open a tiny stream with an exact facing mode,
//! release it at once, and remember the answer for the whole session.

use crate::config::ProbeConfig;
use crate::devices::{release_stream, MediaDevices};
use crate::types::{FacingMode, MediaConstraints};
use serde::Serialize;

/// Probe result per facing mode, built once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstraintMap {
    front: Option<MediaConstraints>,
    back: Option<MediaConstraints>,
}

impl ConstraintMap {
    pub fn new(front: Option<MediaConstraints>, back: Option<MediaConstraints>) -> Self {
        Self { front, back }
    }

    pub fn get(&self, facing: FacingMode) -> Option<&MediaConstraints> {
        match facing {
            FacingMode::Front => self.front.as_ref(),
            FacingMode::Back => self.back.as_ref(),
        }
    }

    pub fn is_supported(&self, facing: FacingMode) -> bool {
        self.get(facing).is_some()
    }

    pub fn supported(&self) -> Vec<FacingMode> {
        FacingMode::ALL
            .into_iter()
            .filter(|m| self.is_supported(*m))
            .collect()
    }

    /// Toggling needs both cameras.
    pub fn can_toggle(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    /// `preferred` when supported, else the other mode, else `None`.
    pub fn choose(&self, preferred: FacingMode) -> Option<FacingMode> {
        [preferred, preferred.opposite()]
            .into_iter()
            .find(|m| self.is_supported(*m))
    }
}

/// Constraints for a full open of `facing`, or `None` if the device
/// refuses that facing mode for any reason.
pub async fn probe(
    devices: &dyn MediaDevices,
    facing: FacingMode,
    config: &ProbeConfig,
) -> Option<MediaConstraints> {
    let probe_constraints = MediaConstraints::new(facing, config.probe_width, config.probe_height);

    match devices.request_stream(&probe_constraints).await {
        Ok(stream) => {
            let tracks = stream.tracks().len();
            release_stream(devices, stream);
            log::debug!("Probe for {} camera succeeded ({} tracks released)", facing, tracks);
            Some(
                MediaConstraints::new(facing, config.ideal_width, config.ideal_height)
                    .with_audio(config.audio),
            )
        }
        Err(failure) => {
            log::debug!("Probe for {} camera failed: {}", facing, failure);
            None
        }
    }
}

/// Probe each facing mode once.
pub async fn build_constraint_map(devices: &dyn MediaDevices, config: &ProbeConfig) -> ConstraintMap {
    let front = probe(devices, FacingMode::Front, config).await;
    let back = probe(devices, FacingMode::Back, config).await;
    let map = ConstraintMap::new(front, back);
    log::info!("Supported facing modes: {:?}", map.supported());
    map
}
