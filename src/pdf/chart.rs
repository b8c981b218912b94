use pdf_writer::Content;
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use super::layout::show_text;
use crate::error::Error;
use crate::fonts::FontEntry;
use crate::model::MAX_RATING;

const RING_COLOR: [f32; 3] = [0.78, 0.78, 0.78];
const AXIS_COLOR: [f32; 3] = [0.6, 0.6, 0.6];
const AREA_FILL: [f32; 3] = [0.73, 0.83, 0.95];
const AREA_STROKE: [f32; 3] = [0.12, 0.38, 0.7];
const LABEL_SIZE: f32 = 7.0;
/// Space kept between the outer ring and the chart's bounding square for labels.
const LABEL_ROOM: f32 = 24.0;

/// Unit vectors of the `n` axes, clockwise from twelve o'clock, y pointing up.
fn axis_directions(n: usize) -> Vec<(f32, f32)> {
    (0..n)
        .map(|i| {
            let theta = std::f32::consts::FRAC_PI_2 - i as f32 * std::f32::consts::TAU / n as f32;
            (theta.cos(), theta.sin())
        })
        .collect()
}

fn polygon(content: &mut Content, cx: f32, cy: f32, points: &[(f32, f32)], radii: impl Iterator<Item = f32>) {
    for (i, (&(dx, dy), r)) in points.iter().zip(radii).enumerate() {
        let (x, y) = (cx + dx * r, cy + dy * r);
        if i == 0 {
            content.move_to(x, y);
        } else {
            content.line_to(x, y);
        }
    }
    content.close_path();
}

/// Draw a radar chart for `values` (each 0..=5) into the square whose top-left
/// corner is `(left, top)` in PDF space.
pub(super) fn draw_radar(
    content: &mut Content,
    font: &FontEntry,
    values: &[u8],
    labels: &[String],
    left: f32,
    top: f32,
    size: f32,
) {
    let n = values.len();
    if n < 3 {
        log::debug!("radar chart needs at least 3 axes, got {n}");
        return;
    }
    let dirs = axis_directions(n);
    let cx = left + size / 2.0;
    let cy = top - size / 2.0;
    let radius = (size / 2.0 - LABEL_ROOM).max(size / 4.0);

    content.save_state();

    content.set_line_width(0.5);
    content.set_stroke_rgb(RING_COLOR[0], RING_COLOR[1], RING_COLOR[2]);
    for level in 1..=MAX_RATING {
        let r = radius * level as f32 / MAX_RATING as f32;
        polygon(content, cx, cy, &dirs, std::iter::repeat(r));
        content.stroke();
    }

    content.set_stroke_rgb(AXIS_COLOR[0], AXIS_COLOR[1], AXIS_COLOR[2]);
    for &(dx, dy) in &dirs {
        content.move_to(cx, cy);
        content.line_to(cx + dx * radius, cy + dy * radius);
        content.stroke();
    }

    content.set_fill_rgb(AREA_FILL[0], AREA_FILL[1], AREA_FILL[2]);
    content.set_stroke_rgb(AREA_STROKE[0], AREA_STROKE[1], AREA_STROKE[2]);
    content.set_line_width(1.2);
    let value_radii = values
        .iter()
        .map(|&v| radius * v.min(MAX_RATING) as f32 / MAX_RATING as f32);
    polygon(content, cx, cy, &dirs, value_radii);
    content.fill_nonzero_and_stroke();

    content.set_fill_rgb(AREA_STROKE[0], AREA_STROKE[1], AREA_STROKE[2]);
    for (&(dx, dy), &v) in dirs.iter().zip(values) {
        let r = radius * v.min(MAX_RATING) as f32 / MAX_RATING as f32;
        content.rect(cx + dx * r - 1.5, cy + dy * r - 1.5, 3.0, 3.0);
        content.fill_nonzero();
    }

    content.set_fill_rgb(0.2, 0.2, 0.2);
    for ((&(dx, dy), label), &v) in dirs.iter().zip(labels).zip(values) {
        let text = format!("{label} ({v})");
        let w = font.word_width(&text, LABEL_SIZE);
        let ax = cx + dx * (radius + 5.0);
        let ay = cy + dy * (radius + 5.0);
        let x = if dx < -0.15 {
            ax - w
        } else if dx > 0.15 {
            ax
        } else {
            ax - w / 2.0
        };
        let y = if dy > 0.15 {
            ay
        } else if dy < -0.15 {
            ay - LABEL_SIZE
        } else {
            ay - LABEL_SIZE / 3.0
        };
        show_text(content, font, LABEL_SIZE, x, y, &text);
    }

    content.restore_state();
}

/// Largest PNG edge `rasterize_png` accepts, in pixels.
pub const MAX_PNG_SIZE: u32 = 4096;

fn paint(c: [f32; 3]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(
        (c[0] * 255.0) as u8,
        (c[1] * 255.0) as u8,
        (c[2] * 255.0) as u8,
        255,
    );
    paint.anti_alias = true;
    paint
}

fn closed_path(points: &[(f32, f32)]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

/// Rasterize the same radar geometry (rings, axes, filled value polygon) as a
/// PNG of `size`×`size` pixels.
pub fn rasterize_png(values: &[u8], size: u32) -> Result<Vec<u8>, Error> {
    if values.len() < 3 {
        return Err(Error::Pdf(format!(
            "radar chart needs at least 3 axes, got {}",
            values.len()
        )));
    }
    if size > MAX_PNG_SIZE {
        return Err(Error::Pdf(format!(
            "chart size {size}px exceeds the {MAX_PNG_SIZE}px limit"
        )));
    }
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| Error::Pdf(format!("cannot allocate a {size}x{size} chart")))?;
    pixmap.fill(Color::WHITE);

    let dirs = axis_directions(values.len());
    let c = size as f32 / 2.0;
    let radius = size as f32 * 0.42;
    // Image rows grow downward.
    let at = |(dx, dy): (f32, f32), r: f32| (c + dx * r, c - dy * r);
    let thin = Stroke {
        width: (size as f32 / 256.0).max(1.0),
        ..Stroke::default()
    };

    let area: Vec<(f32, f32)> = dirs
        .iter()
        .zip(values)
        .map(|(&d, &v)| at(d, radius * v.min(MAX_RATING) as f32 / MAX_RATING as f32))
        .collect();
    let area_path = closed_path(&area);
    if let Some(path) = &area_path {
        pixmap.fill_path(path, &paint(AREA_FILL), FillRule::Winding, Transform::identity(), None);
    }

    let ring = paint(RING_COLOR);
    for level in 1..=MAX_RATING {
        let r = radius * level as f32 / MAX_RATING as f32;
        let points: Vec<(f32, f32)> = dirs.iter().map(|&d| at(d, r)).collect();
        if let Some(path) = closed_path(&points) {
            pixmap.stroke_path(&path, &ring, &thin, Transform::identity(), None);
        }
    }

    let mut axes = PathBuilder::new();
    for &d in &dirs {
        let (x, y) = at(d, radius);
        axes.move_to(c, c);
        axes.line_to(x, y);
    }
    if let Some(path) = axes.finish() {
        pixmap.stroke_path(&path, &paint(AXIS_COLOR), &thin, Transform::identity(), None);
    }

    if let Some(path) = &area_path {
        let outline = Stroke {
            width: thin.width * 2.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(path, &paint(AREA_STROKE), &outline, Transform::identity(), None);
    }

    pixmap
        .encode_png()
        .map_err(|e| Error::Pdf(format!("PNG encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_axis_points_up() {
        let dirs = axis_directions(4);
        assert!(dirs[0].0.abs() < 1e-6 && (dirs[0].1 - 1.0).abs() < 1e-6);
        // clockwise: second axis points right
        assert!((dirs[1].0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn png_has_requested_size_and_fill() {
        let bytes = rasterize_png(&[5, 5, 5, 5, 5, 5], 128).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (128, 128));
        // Between the first two rings, halfway between the first two axes.
        let expected = [
            (AREA_FILL[0] * 255.0) as u8,
            (AREA_FILL[1] * 255.0) as u8,
            (AREA_FILL[2] * 255.0) as u8,
            255,
        ];
        assert_eq!(img.get_pixel(71, 51).0, expected);
        // Outside the outer ring stays white.
        assert_eq!(img.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn zero_ratings_still_render() {
        assert!(rasterize_png(&[0, 0, 0], 64).is_ok());
    }

    #[test]
    fn rejects_degenerate_and_oversized_charts() {
        assert!(rasterize_png(&[1, 2], 64).is_err());
        assert!(matches!(rasterize_png(&[1, 2, 3], MAX_PNG_SIZE + 1), Err(Error::Pdf(_))));
        assert!(matches!(rasterize_png(&[1, 2, 3], 0), Err(Error::Pdf(_))));
    }
}
