//! Core value types shared across the capture pipeline.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which way the camera points.
///
/// Serialized with the browser `facingMode` names: `user` for the front
/// camera, `environment` for the back camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacingMode {
    #[serde(rename = "user")]
    Front,
    #[serde(rename = "environment")]
    Back,
}

impl FacingMode {
    pub const ALL: [FacingMode; 2] = [FacingMode::Front, FacingMode::Back];

    pub fn opposite(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Front => "user",
            FacingMode::Back => "environment",
        }
    }

    /// Front-camera output is mirrored to match the live preview.
    pub fn is_mirrored(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(FacingMode::Front),
            "back" | "environment" => Ok(FacingMode::Back),
            other => Err(format!("unknown facing mode: {other}")),
        }
    }
}

/// Constraints handed to the device layer when requesting a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn new(facing_mode: FacingMode, ideal_width: u32, ideal_height: u32) -> Self {
        Self {
            facing_mode,
            ideal_width,
            ideal_height,
            audio: false,
        }
    }

    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }
}

/// Zoom range supported by the active video track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Nearest value inside the range, snapped to `step` from `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        let bounded = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return bounded;
        }
        let steps = ((bounded - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

/// Zoom capability as reported by a track, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCapability {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Capability descriptor of a single track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCapabilities {
    pub zoom: Option<ZoomCapability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
}

impl MediaTrack {
    pub fn video(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: TrackKind::Video,
            label: label.into(),
        }
    }

    pub fn audio(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: TrackKind::Audio,
            label: label.into(),
        }
    }
}

/// Handle to a live media source.
///
/// Deliberately not `Clone`: whoever holds the value owns the stream and is
/// responsible for stopping its tracks.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    pub fn first_video_track(&self) -> Option<&MediaTrack> {
        self.video_tracks().next()
    }
}

/// One RGB24 video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Encoding used for captured photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFormat {
    Png,
    Jpeg,
}

impl PhotoFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            PhotoFormat::Png => "image/png",
            PhotoFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PhotoFormat::Png => "png",
            PhotoFormat::Jpeg => "jpg",
        }
    }
}

/// An encoded still image produced by the shutter.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: Uuid,
    pub bytes: Bytes,
    pub format: PhotoFormat,
    pub width: u32,
    pub height: u32,
    pub facing_mode: FacingMode,
    pub mirrored: bool,
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
