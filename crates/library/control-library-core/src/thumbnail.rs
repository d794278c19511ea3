//! Software thumbnail rasterizer shared by headless capture backends.
//!
//! Draws world-space polylines (curve control polygons) from an orthographic
//! front view, X to the right and Y up.

use std::path::Path;

use glam::DVec3;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::CaptureError;

pub const BACKGROUND: Rgba<u8> = Rgba([58, 58, 58, 255]);
pub const CURVE_COLOR: Rgba<u8> = Rgba([240, 200, 64, 255]);

/// Orthographic front view: world-space center and visible edge length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    pub center: DVec3,
    pub extent: f64,
}

impl View {
    /// Tight view around `points` with a small margin. `None` when empty.
    pub fn framing(points: &[DVec3]) -> Option<View> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let size = max - min;
        Some(View {
            center: (min + max) * 0.5,
            extent: (size.x.max(size.y) * 1.2).max(1e-3),
        })
    }
}

impl Default for View {
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            extent: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<DVec3>,
    /// Draw a segment from the last point back to the first.
    pub closed: bool,
}

pub fn render_front(polylines: &[Polyline], view: &View, size: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(size, size, BACKGROUND);
    let scale = size as f64 / view.extent.max(f64::EPSILON);
    let half = size as f64 / 2.0;
    let to_pixel = |p: &DVec3| {
        (
            half + (p.x - view.center.x) * scale,
            half - (p.y - view.center.y) * scale,
        )
    };

    for line in polylines {
        let pts: Vec<(f64, f64)> = line.points.iter().map(to_pixel).collect();
        for seg in pts.windows(2) {
            draw_line(&mut img, seg[0], seg[1], CURVE_COLOR);
        }
        if line.closed && pts.len() > 2 {
            draw_line(&mut img, pts[pts.len() - 1], pts[0], CURVE_COLOR);
        }
    }
    img
}

pub fn write_png(img: &RgbaImage, path: &Path) -> Result<(), CaptureError> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| CaptureError::Failed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Liang-Barsky clip of a pixel-space segment to `[0, max_x] x [0, max_y]`.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    max_x: f64,
    max_y: f64,
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, from.0),
        (dx, max_x - from.0),
        (-dy, from.1),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

// Bresenham over the part of the segment inside the image.
fn draw_line(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Rgba<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    if w == 0 || h == 0 {
        return;
    }
    let Some((from, to)) = clip_segment(from, to, (w - 1) as f64, (h - 1) as f64) else {
        return;
    };
    let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if (0..w).contains(&x0) && (0..h).contains(&y0) {
            img.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
