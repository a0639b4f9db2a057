//! User-facing camera session.
//!
//! A [`CameraSession`] probes the device once, opens the preferred camera
//! and then serves presentation-layer commands: toggle facing mode, set
//! zoom, capture a photo. Commands never interleave; one issued while
//! another is in flight fails with [`CameraError::Busy`].

use crate::capture;
use crate::config::CrabSnapConfig;
use crate::devices::{MediaDevices, NoopPrimer, PermissionPrimer};
use crate::errors::CameraError;
use crate::probe::{self, ConstraintMap};
use crate::stream::StreamManager;
use crate::types::{FacingMode, Photo, ZoomRange};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};

/// Callback receiving every captured photo.
pub type PhotoHandler = Box<dyn Fn(&Photo) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Initializing,
    Ready,
    Switching,
    Closed,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub facing_mode: Option<FacingMode>,
    pub zoom: f64,
    pub zoom_range: Option<ZoomRange>,
    pub stream_active: bool,
    pub can_toggle: bool,
}

struct SessionCore {
    streams: StreamManager,
    constraints: ConstraintMap,
    facing: Option<FacingMode>,
    phase: SessionPhase,
}

impl SessionCore {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            facing_mode: self.facing,
            zoom: self.streams.zoom(),
            zoom_range: self.streams.zoom_range(),
            stream_active: self.streams.is_open(),
            can_toggle: self.constraints.can_toggle(),
        }
    }

    fn ensure_ready(&self) -> Result<(), CameraError> {
        match self.phase {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Initializing => Err(CameraError::InvalidState(
                "session is not initialized".to_string(),
            )),
            SessionPhase::Switching => Err(CameraError::Busy),
            SessionPhase::Closed => Err(CameraError::InvalidState(
                "session is shut down".to_string(),
            )),
        }
    }
}

pub struct CameraSession {
    devices: Arc<dyn MediaDevices>,
    primer: Arc<dyn PermissionPrimer>,
    config: CrabSnapConfig,
    core: Mutex<SessionCore>,
    state_tx: watch::Sender<SessionSnapshot>,
    photo_handler: Option<PhotoHandler>,
}

impl CameraSession {
    pub fn new(devices: Arc<dyn MediaDevices>, config: CrabSnapConfig) -> Self {
        let core = SessionCore {
            streams: StreamManager::new(devices.clone()),
            constraints: ConstraintMap::default(),
            facing: None,
            phase: SessionPhase::Initializing,
        };
        let (state_tx, _) = watch::channel(core.snapshot());

        Self {
            devices,
            primer: Arc::new(NoopPrimer),
            config,
            core: Mutex::new(core),
            state_tx,
            photo_handler: None,
        }
    }

    pub fn with_primer(mut self, primer: Arc<dyn PermissionPrimer>) -> Self {
        self.primer = primer;
        self
    }

    pub fn with_photo_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Photo) + Send + Sync + 'static,
    {
        self.photo_handler = Some(Box::new(handler));
        self
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn can_toggle(&self) -> bool {
        self.snapshot().can_toggle
    }

    /// Probe both cameras, pick one and open it.
    ///
    /// Returns the chosen facing mode. If the open fails the session is
    /// still `Ready`, without a stream, and the error is returned; call
    /// [`reopen`](Self::reopen) to try again. Dropping the future before a
    /// camera is chosen closes the session; dropping it during the open
    /// leaves it `Ready` without a stream.
    pub async fn initialize(&self) -> Result<FacingMode, CameraError> {
        let mut guard = self.acquire()?;
        if guard.phase != SessionPhase::Initializing {
            return Err(CameraError::InvalidState(
                "session is already initialized".to_string(),
            ));
        }

        log::info!("Initializing camera session");
        guard.restore_on_cancel(SessionPhase::Closed);
        self.primer.prime().await;

        let constraints = probe::build_constraint_map(self.devices.as_ref(), &self.config.probe).await;
        guard.constraints = constraints;

        let facing = match guard.constraints.choose(self.config.session.preferred_facing) {
            Some(facing) => facing,
            None => {
                log::error!("No camera available");
                guard.phase = SessionPhase::Closed;
                guard.finish();
                return Err(CameraError::NoCamera);
            }
        };

        guard.facing = Some(facing);
        guard.restore_on_cancel(SessionPhase::Ready);
        let core = &mut *guard;
        let result = core.streams.open(facing, core.constraints.get(facing)).await;
        guard.phase = SessionPhase::Ready;
        guard.finish();
        result.map(|_| facing)
    }

    /// Switch to the other camera.
    ///
    /// Returns `Ok(false)` without doing anything when the device does not
    /// have both cameras. When the new camera fails to open, or the future
    /// is dropped mid-switch, the session is left `Ready` on that facing
    /// mode without a stream.
    pub async fn toggle_facing_mode(&self) -> Result<bool, CameraError> {
        let mut guard = self.acquire()?;
        guard.ensure_ready()?;

        if !guard.constraints.can_toggle() {
            log::debug!("Toggle ignored: device has a single camera");
            return Ok(false);
        }

        let target = guard.facing.unwrap_or(self.config.session.preferred_facing).opposite();
        guard.phase = SessionPhase::Switching;
        guard.facing = Some(target);
        guard.publish();
        guard.restore_on_cancel(SessionPhase::Ready);

        let core = &mut *guard;
        let result = core
            .streams
            .swap_facing_mode(target, core.constraints.get(target))
            .await;
        guard.phase = SessionPhase::Ready;
        guard.finish();

        if let Err(e) = &result {
            log::warn!("Switch to {} camera failed: {}", target, e);
        }
        result.map(|_| true)
    }

    /// Open the current camera again after a failed open.
    ///
    /// Does nothing while a stream is active.
    pub async fn reopen(&self) -> Result<(), CameraError> {
        let mut guard = self.acquire()?;
        guard.ensure_ready()?;

        if guard.streams.is_open() {
            return Ok(());
        }
        let facing = guard
            .facing
            .ok_or_else(|| CameraError::InvalidState("no facing mode selected".to_string()))?;

        guard.restore_on_cancel(SessionPhase::Ready);
        let core = &mut *guard;
        let result = core.streams.open(facing, core.constraints.get(facing)).await;
        guard.finish();
        result
    }

    /// Set the zoom of the active camera and return the applied value.
    ///
    /// Out-of-range values are rejected or clamped according to
    /// `config.zoom.policy`; on error the zoom is unchanged.
    pub async fn set_zoom(&self, value: f64) -> Result<f64, CameraError> {
        let mut guard = self.acquire()?;
        guard.ensure_ready()?;

        let result = guard.streams.apply_zoom(value, self.config.zoom.policy).await;
        if let Err(e) = &result {
            log::warn!("Zoom {} rejected: {}", value, e);
        }
        guard.publish();
        result
    }

    /// Capture one photo from the active camera.
    ///
    /// The photo is returned and, if registered, passed to the photo
    /// handler. It is not stored anywhere.
    pub async fn capture_photo(&self) -> Result<Photo, CameraError> {
        let guard = self.acquire()?;
        guard.ensure_ready()?;

        let stream = guard
            .streams
            .stream()
            .ok_or_else(|| CameraError::Unavailable("no active stream".to_string()))?;
        let facing = guard
            .streams
            .facing_mode()
            .ok_or_else(|| CameraError::Unavailable("no active stream".to_string()))?;

        let photo = capture::capture(self.devices.as_ref(), stream, facing, &self.config.capture)?;
        if let Some(handler) = &self.photo_handler {
            handler(&photo);
        }
        Ok(photo)
    }

    /// Close the stream and end the session.
    ///
    /// Waits for any in-flight command to finish first, so an open in
    /// progress completes and is then closed. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let mut guard = self.core.lock().await;
        if guard.phase == SessionPhase::Closed && !guard.streams.is_open() {
            return;
        }
        guard.streams.close();
        guard.phase = SessionPhase::Closed;
        log::info!("Camera session shut down");
        self.publish(&guard);
    }

    fn acquire(&self) -> Result<CommandGuard<'_>, CameraError> {
        let core = self.core.try_lock().map_err(|_| CameraError::Busy)?;
        if core.phase == SessionPhase::Closed {
            return Err(CameraError::InvalidState(
                "session is shut down".to_string(),
            ));
        }
        Ok(CommandGuard {
            core,
            state_tx: &self.state_tx,
            on_cancel: None,
        })
    }

    fn publish(&self, core: &SessionCore) {
        self.state_tx.send_replace(core.snapshot());
    }
}

/// Exclusive access to the core for the duration of one command.
///
/// While armed with [`restore_on_cancel`](Self::restore_on_cancel), dropping
/// the guard without [`finish`](Self::finish) puts the session in the given
/// phase and publishes it. The stream manager has already fallen back to
/// `Closed` by then.
struct CommandGuard<'a> {
    core: MutexGuard<'a, SessionCore>,
    state_tx: &'a watch::Sender<SessionSnapshot>,
    on_cancel: Option<SessionPhase>,
}

impl CommandGuard<'_> {
    fn restore_on_cancel(&mut self, phase: SessionPhase) {
        self.on_cancel = Some(phase);
    }

    /// Disarm and publish the final state.
    fn finish(&mut self) {
        self.on_cancel = None;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.core.snapshot());
    }
}

impl Deref for CommandGuard<'_> {
    type Target = SessionCore;

    fn deref(&self) -> &SessionCore {
        &self.core
    }
}

impl DerefMut for CommandGuard<'_> {
    fn deref_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        if let Some(phase) = self.on_cancel.take() {
            log::warn!("Camera command cancelled, session back to {:?}", phase);
            self.core.phase = phase;
            self.publish();
        }
    }
}
