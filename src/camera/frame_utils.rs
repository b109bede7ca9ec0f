//! Frame conversion and transformation utilities.

use image::imageops::{self, FilterType};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;

use super::types::{Frame, Resolution};

/// Convert a nokhwa buffer to our RGB Frame format.
///
/// nokhwa's `decode_image` handles MJPEG, YUYV, NV12 and friends.
/// Returns `None` if the conversion fails (unsupported format or corrupt data).
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame::rgb(
        decoded.into_raw(),
        resolution.width(),
        resolution.height(),
    ))
}

/// Center-crop a frame to the aspect ratio of `target` and scale it to
/// exactly `target`.
///
/// Frames that already match are returned untouched. Returns `None` when
/// the pixel buffer does not match the declared dimensions.
pub fn fit_to(frame: Frame, target: Resolution) -> Option<Frame> {
    if frame.resolution() == target {
        return Some(frame);
    }
    if frame.width == 0 || frame.height == 0 || target.width == 0 || target.height == 0 {
        return None;
    }

    let timestamp = frame.timestamp;
    let (width, height) = (frame.width, frame.height);
    let img = RgbImage::from_raw(width, height, frame.data)?;

    // Largest window with the target aspect ratio, centred.
    let (crop_w, crop_h) = {
        let scaled_w = (height as u64 * target.width as u64 / target.height as u64) as u32;
        if scaled_w <= width {
            (scaled_w.max(1), height)
        } else {
            let scaled_h = (width as u64 * target.height as u64 / target.width as u64) as u32;
            (width, scaled_h.max(1))
        }
    };
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;

    let cropped = imageops::crop_imm(&img, x, y, crop_w, crop_h).to_image();
    let resized = imageops::resize(&cropped, target.width, target.height, FilterType::Triangle);

    let mut out = Frame::rgb(resized.into_raw(), target.width, target.height);
    out.timestamp = timestamp;
    Some(out)
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let bpp = frame.bytes_per_pixel();
    let stride = width * bpp;
    if stride == 0 {
        return;
    }

    for row in frame.data.chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
