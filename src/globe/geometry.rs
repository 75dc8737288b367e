use ratatui::style::Color;

use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32), color: Color) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        canvas.set_pixel_signed(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled disc
pub fn draw_disc(canvas: &mut BrailleCanvas, center: (i32, i32), radius: i32, color: Color) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy, color);
            }
        }
    }
}

/// Draw a circle outline in screen space (the globe limb)
pub fn draw_ring(canvas: &mut BrailleCanvas, center: (i32, i32), radius: f64, color: Color) {
    if radius <= 0.0 {
        return;
    }
    // One sample per pixel of circumference keeps the ring gap-free
    let steps = ((radius * std::f64::consts::TAU).ceil() as usize).max(8);
    for i in 0..steps {
        let a = i as f64 / steps as f64 * std::f64::consts::TAU;
        let x = center.0 + (radius * a.cos()).round() as i32;
        let y = center.1 + (radius * a.sin()).round() as i32;
        canvas.set_pixel_signed(x, y, color);
    }
}

/// Connect consecutive projected points; `None` breaks the line.
/// Jumps longer than `max_jump` pixels are skipped (limb crossings).
pub fn draw_polyline(
    canvas: &mut BrailleCanvas,
    points: impl IntoIterator<Item = Option<(i32, i32)>>,
    max_jump: i32,
    color: Color,
) {
    let mut prev: Option<(i32, i32)> = None;
    for point in points {
        match (prev, point) {
            (Some(a), Some(b)) if (a.0 - b.0).abs() + (a.1 - b.1).abs() <= max_jump => {
                draw_line(canvas, a, b, color);
            }
            (None, Some(b)) => canvas.set_pixel_signed(b.0, b.1, color),
            _ => {}
        }
        prev = point;
    }
}
