//! Still capture from the active stream.

use crate::config::CaptureConfig;
use crate::devices::MediaDevices;
use crate::errors::CameraError;
use crate::types::{FacingMode, MediaStream, Photo, PhotoFormat, VideoFrame};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use uuid::Uuid;

/// Render one frame of `stream` to an encoded photo.
///
/// Front-camera frames are mirrored horizontally so the photo matches the
/// preview the user saw. No retry is attempted when the track has not
/// produced a frame yet.
pub fn capture(
    devices: &dyn MediaDevices,
    stream: &MediaStream,
    facing: FacingMode,
    config: &CaptureConfig,
) -> Result<Photo, CameraError> {
    let track = stream
        .first_video_track()
        .ok_or_else(|| CameraError::Capture("stream has no video track".to_string()))?;
    let frame = devices
        .grab_frame(track)
        .ok_or_else(|| CameraError::Capture("no frame available yet".to_string()))?;

    let mirrored = facing.is_mirrored();
    let (width, height) = (frame.width, frame.height);
    let bytes = encode_frame(frame, mirrored, config)?;

    log::info!(
        "Captured {}x{} {} photo from {} camera ({} bytes)",
        width,
        height,
        config.format.extension(),
        facing,
        bytes.len()
    );

    Ok(Photo {
        id: Uuid::new_v4(),
        bytes,
        format: config.format,
        width,
        height,
        facing_mode: facing,
        mirrored,
        captured_at: chrono::Utc::now(),
    })
}

fn encode_frame(frame: VideoFrame, mirrored: bool, config: &CaptureConfig) -> Result<Bytes, CameraError> {
    if frame.width == 0 || frame.height == 0 || frame.data.len() != frame.expected_len() {
        return Err(CameraError::Capture(format!(
            "frame buffer of {} bytes does not match {}x{} RGB",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let mut img = RgbImage::from_vec(frame.width, frame.height, frame.data)
        .ok_or_else(|| CameraError::Capture("Failed to create image from frame data".to_string()))?;
    if mirrored {
        imageops::flip_horizontal_in_place(&mut img);
    }
    let img = DynamicImage::ImageRgb8(img);

    let mut buffer = Cursor::new(Vec::new());
    let encoded = match config.format {
        PhotoFormat::Png => img.write_to(&mut buffer, ImageFormat::Png),
        PhotoFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
            img.write_with_encoder(encoder)
        }
    };
    encoded.map_err(|e| CameraError::Capture(format!("Failed to encode photo: {}", e)))?;

    Ok(Bytes::from(buffer.into_inner()))
}
