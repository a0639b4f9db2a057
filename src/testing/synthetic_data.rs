//! Synthetic frames with a known left/right orientation

use crate::types::VideoFrame;

const MARKER: [u8; 3] = [255, 0, 0];

/// Width in pixels of the red band painted on the left edge.
pub fn marker_width(width: u32) -> u32 {
    (width / 4).max(1)
}

/// Create a synthetic RGB24 frame.
///
/// The leftmost quarter is solid red; the rest is blue with a green level
/// that changes per frame so consecutive frames differ.
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> VideoFrame {
    let mut data = vec![0u8; width as usize * height as usize * 3];
    let band = marker_width(width);
    let green = (frame_number % 128) as u8;

    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize * width as usize + x as usize) * 3;
            let pixel = if x < band { MARKER } else { [0, green, 255] };
            data[idx..idx + 3].copy_from_slice(&pixel);
        }
    }

    VideoFrame::new(width, height, data)
}

/// Whether an RGB pixel is (close to) the marker colour.
///
/// Tolerant enough to survive JPEG encoding.
pub fn is_marker_pixel(rgb: [u8; 3]) -> bool {
    rgb[0] > 200 && rgb[1] < 60 && rgb[2] < 60
}
