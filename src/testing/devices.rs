//! Scriptable in-memory `MediaDevices`

use crate::devices::MediaDevices;
use crate::errors::DeviceFailure;
use crate::testing::synthetic_data::synthetic_video_frame;
use crate::types::{
    FacingMode, MediaConstraints, MediaStream, MediaTrack, TrackCapabilities, TrackKind,
    VideoFrame, ZoomCapability,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::watch;

/// One simulated camera.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
    pub zoom: Option<ZoomCapability>,
    /// Whether the camera produces frames as soon as it is opened
    pub frame_ready: bool,
}

impl SyntheticCamera {
    pub fn new(facing: FacingMode) -> Self {
        Self {
            facing,
            width: 64,
            height: 48,
            zoom: None,
            frame_ready: true,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_zoom(self, min: f64, max: f64, step: f64) -> Self {
        self.with_zoom_capability(ZoomCapability { min, max, step })
    }

    pub fn with_zoom_capability(mut self, zoom: ZoomCapability) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn without_frames(mut self) -> Self {
        self.frame_ready = false;
        self
    }
}

#[derive(Default)]
struct DeviceState {
    cameras: HashMap<FacingMode, SyntheticCamera>,
    scripted: HashMap<FacingMode, VecDeque<Option<DeviceFailure>>>,
    live_tracks: HashMap<String, FacingMode>,
    requests: Vec<MediaConstraints>,
    stopped: Vec<String>,
    applied_zoom: Vec<f64>,
    reject_zoom: bool,
    frames_served: u64,
}

/// In-memory device layer.
///
/// Records every request, stop and zoom call so tests can assert on the
/// exact traffic a session produced.
pub struct SyntheticDevices {
    state: Mutex<DeviceState>,
    paused: watch::Sender<bool>,
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDevices {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(DeviceState::default()),
            paused,
        }
    }

    pub fn with_camera(self, camera: SyntheticCamera) -> Self {
        self.add_camera(camera);
        self
    }

    /// Front and back cameras, each with a distinct zoom range.
    pub fn front_and_back() -> Self {
        Self::new()
            .with_camera(SyntheticCamera::new(FacingMode::Front).with_zoom(1.0, 3.0, 0.5))
            .with_camera(SyntheticCamera::new(FacingMode::Back).with_zoom(1.0, 10.0, 0.1))
    }

    pub fn add_camera(&self, camera: SyntheticCamera) {
        self.lock().cameras.insert(camera.facing, camera);
    }

    /// Make the next scripted request for `facing` fail with `failure`.
    ///
    /// Scripted outcomes are consumed in order, one per request.
    pub fn fail_next_open(&self, facing: FacingMode, failure: DeviceFailure) {
        self.script(facing, Some(failure));
    }

    /// Let the next scripted request for `facing` succeed, so a later
    /// scripted failure hits the request after it.
    pub fn pass_next_open(&self, facing: FacingMode) {
        self.script(facing, None);
    }

    fn script(&self, facing: FacingMode, outcome: Option<DeviceFailure>) {
        self.lock()
            .scripted
            .entry(facing)
            .or_default()
            .push_back(outcome);
    }

    /// Make the device refuse every zoom change.
    pub fn set_reject_zoom(&self, reject: bool) {
        self.lock().reject_zoom = reject;
    }

    pub fn set_frame_ready(&self, facing: FacingMode, ready: bool) {
        if let Some(camera) = self.lock().cameras.get_mut(&facing) {
            camera.frame_ready = ready;
        }
    }

    /// Hold every stream request until `resume_opens` is called,
    /// like a permission prompt left open.
    pub fn pause_opens(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume_opens(&self) {
        self.paused.send_replace(false);
    }

    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.lock().requests.clone()
    }

    pub fn requests_for(&self, facing: FacingMode) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|c| c.facing_mode == facing)
            .count()
    }

    pub fn stopped_tracks(&self) -> Vec<String> {
        self.lock().stopped.clone()
    }

    pub fn live_track_count(&self) -> usize {
        self.lock().live_tracks.len()
    }

    pub fn applied_zoom(&self) -> Vec<f64> {
        self.lock().applied_zoom.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().expect("lock poisoned")
    }

    async fn wait_until_resumed(&self) {
        let mut rx = self.paused.subscribe();
        loop {
            let paused = *rx.borrow_and_update();
            if !paused || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn request_stream(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, DeviceFailure> {
        self.lock().requests.push(constraints.clone());
        self.wait_until_resumed().await;

        let mut state = self.lock();
        let facing = constraints.facing_mode;

        let scripted = state
            .scripted
            .get_mut(&facing)
            .and_then(|queue| queue.pop_front());
        if let Some(Some(failure)) = scripted {
            return Err(failure);
        }

        if !state.cameras.contains_key(&facing) {
            return Err(DeviceFailure::NotFound);
        }
        let mut tracks = vec![MediaTrack::video(format!("synthetic {facing} camera"))];
        if constraints.audio {
            tracks.push(MediaTrack::audio("synthetic microphone"));
        }

        for track in &tracks {
            state.live_tracks.insert(track.id.clone(), facing);
        }
        Ok(MediaStream::new(tracks))
    }

    fn capabilities(&self, track: &MediaTrack) -> TrackCapabilities {
        let state = self.lock();
        let camera = state
            .live_tracks
            .get(&track.id)
            .filter(|_| track.kind == TrackKind::Video)
            .and_then(|facing| state.cameras.get(facing));

        match camera {
            Some(camera) => TrackCapabilities { zoom: camera.zoom },
            None => TrackCapabilities::default(),
        }
    }

    async fn apply_zoom(&self, track: &MediaTrack, zoom: f64) -> Result<(), DeviceFailure> {
        let mut state = self.lock();
        if !state.live_tracks.contains_key(&track.id) {
            return Err(DeviceFailure::Hardware("track has ended".to_string()));
        }
        if state.reject_zoom {
            return Err(DeviceFailure::Overconstrained);
        }
        state.applied_zoom.push(zoom);
        Ok(())
    }

    fn stop_track(&self, track: &MediaTrack) {
        let mut state = self.lock();
        state.live_tracks.remove(&track.id);
        state.stopped.push(track.id.clone());
    }

    fn grab_frame(&self, track: &MediaTrack) -> Option<VideoFrame> {
        let mut state = self.lock();
        let facing = *state.live_tracks.get(&track.id)?;
        let camera = state.cameras.get(&facing)?.clone();
        if !camera.frame_ready {
            return None;
        }
        state.frames_served += 1;
        Some(synthetic_video_frame(
            state.frames_served,
            camera.width,
            camera.height,
        ))
    }
}
