//! ASCII rendering of the camera preview.
//!
//! Frame → BT.601 luminance → per-cell average → gamma-corrected density
//! ramp. Terminal cells are about twice as tall as wide, so the grid keeps
//! the frame's aspect ratio by halving the row count.

use crate::camera::Frame;

/// Density ramp from darkest to brightest.
pub const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

const CHAR_ASPECT_RATIO: f32 = 2.0;

/// Largest grid that fits in `max_cols` x `max_rows` and keeps the frame's
/// aspect ratio on screen.
pub fn grid_size(width: u32, height: u32, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 || max_cols == 0 || max_rows == 0 {
        return (0, 0);
    }
    let aspect = width as f32 / height as f32;
    let rows_for_width = (max_cols as f32 / aspect / CHAR_ASPECT_RATIO).round() as u16;
    if rows_for_width <= max_rows {
        (max_cols, rows_for_width.max(1))
    } else {
        let cols = (max_rows as f32 * aspect * CHAR_ASPECT_RATIO).round() as u16;
        (cols.clamp(1, max_cols), max_rows)
    }
}

/// Render `frame` as `rows` lines of `cols` characters.
pub fn render(frame: &Frame, cols: u16, rows: u16) -> Vec<String> {
    let gray = luminance(frame);
    let cells = downsample(&gray, frame.width, frame.height, cols, rows);
    cells
        .chunks(cols.max(1) as usize)
        .map(|row| row.iter().map(|&b| shade(b)).collect())
        .collect()
}

fn luminance(frame: &Frame) -> Vec<u8> {
    frame
        .data
        .chunks_exact(3)
        .map(|rgb| {
            let (r, g, b) = (rgb[0] as u32, rgb[1] as u32, rgb[2] as u32);
            ((299 * r + 587 * g + 114 * b) / 1000) as u8
        })
        .collect()
}

fn downsample(gray: &[u8], width: u32, height: u32, cols: u16, rows: u16) -> Vec<u8> {
    if cols == 0 || rows == 0 || width == 0 || height == 0 || gray.is_empty() {
        return Vec::new();
    }
    let cell_w = width as f32 / cols as f32;
    let cell_h = height as f32 / rows as f32;
    let mut out = Vec::with_capacity(cols as usize * rows as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let x0 = (cx as f32 * cell_w) as u32;
            let x1 = (((cx + 1) as f32 * cell_w) as u32).max(x0 + 1).min(width);
            let y0 = (cy as f32 * cell_h) as u32;
            let y1 = (((cy + 1) as f32 * cell_h) as u32).max(y0 + 1).min(height);

            let mut sum = 0u32;
            let mut count = 0u32;
            for py in y0..y1 {
                for px in x0..x1 {
                    if let Some(&v) = gray.get((py * width + px) as usize) {
                        sum += v as u32;
                        count += 1;
                    }
                }
            }
            out.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }
    out
}

fn shade(brightness: u8) -> char {
    let corrected = (brightness as f32 / 255.0).powf(1.0 / 2.2);
    let idx = (corrected * (RAMP.len() - 1) as f32).round() as usize;
    RAMP[idx.min(RAMP.len() - 1)]
}
