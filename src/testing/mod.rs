//! Testing utilities for CrabSnap
//!
//! An in-memory device layer with scriptable cameras and failures, plus
//! synthetic frames carrying a left-edge marker so mirroring is observable
//! without hardware.

pub mod devices;
pub mod synthetic_data;

pub use devices::{SyntheticCamera, SyntheticDevices};
pub use synthetic_data::{is_marker_pixel, marker_width, synthetic_video_frame};
