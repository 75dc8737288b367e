use std::f64::consts::PI;
use std::time::Instant;

use glam::DVec3;
use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::data::locations::COLORS;
use crate::data::Coastlines;
use crate::geo::{latlng_to_vec3, small_circle, walk_great_circle};
use crate::globe::effects::Burst;
use crate::globe::geometry::{draw_disc, draw_line, draw_polyline, draw_ring};
use crate::globe::layer::GlobeLayer;
use crate::globe::projection::GlobeViewport;
use crate::hash::{hash2, unit_noise};

/// Arc dash pattern, in fractions of the arc length.
const DASH_LENGTH: f64 = 0.4;
const DASH_GAP: f64 = 0.2;
/// Time for a dash to travel the whole arc.
const DASH_CYCLE_MS: u64 = 1000;
/// Ring pulse: maximum radius (degrees) and repeat period.
const RING_MAX_RADIUS_DEG: f64 = 5.0;
const RING_PERIOD_MS: u64 = 1500;
/// Star twinkle: base opacity and swing.
const STAR_OPACITY: f64 = 0.8;
const STAR_TWINKLE: f64 = 0.08;

const LIMB_COLOR: Color = Color::Rgb(0x1e, 0x40, 0xaf);
const COAST_COLOR: Color = Color::Cyan;
const HALO_COLOR: Color = Color::Yellow;

/// Which globe layers to draw.
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_arcs: bool,
    pub show_rings: bool,
    pub show_labels: bool,
    pub show_stars: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_arcs: true,
            show_rings: true,
            show_labels: true,
            show_stars: true,
        }
    }
}

/// Text drawn over the braille canvas, in character cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: Color,
    pub emphasised: bool,
}

/// One rendered frame of the globe.
pub struct GlobeFrame {
    pub canvas: BrailleCanvas,
    pub labels: Vec<Label>,
}

/// Draw the whole globe scene into a `cols` x `rows` character area.
/// An unmounted layer yields an empty frame.
pub fn render_globe(
    layer: &GlobeLayer,
    coastlines: &Coastlines,
    settings: &DisplaySettings,
    cols: usize,
    rows: usize,
    now: Instant,
) -> GlobeFrame {
    let mut canvas = BrailleCanvas::new(cols, rows);
    let mut labels = Vec::new();

    let Some(vp) = layer.viewport() else {
        return GlobeFrame { canvas, labels };
    };
    // Braille gives 2x4 dots per character
    let mut vp = vp.clone();
    let (width, height) = canvas.pixel_size();
    vp.set_size(width, height);
    let elapsed = layer.elapsed_ms(now);

    if settings.show_stars {
        draw_stars(&mut canvas, layer, &vp, elapsed);
    }

    let center = (width as i32 / 2, height as i32 / 2);
    draw_ring(&mut canvas, center, vp.radius(), LIMB_COLOR);

    for line in &coastlines.lines {
        let points = line.iter().map(|&(lng, lat)| vp.project(lat, lng));
        draw_polyline(&mut canvas, points, width as i32, COAST_COLOR);
    }

    if settings.show_arcs {
        draw_arcs(&mut canvas, layer, &vp, elapsed);
    }

    if settings.show_rings {
        draw_pulse_rings(&mut canvas, layer, &vp, elapsed);
    }

    let hovered = layer.hovered();
    let selected = layer.selected();
    for (i, loc) in layer.locations().iter().enumerate() {
        let Some((px, py)) = vp.project(loc.lat, loc.lng) else {
            continue;
        };
        let active = Some(i) == hovered || Some(i) == selected;
        let (radius, color) = if active {
            (2, Color::White)
        } else {
            (1, COLORS[i % COLORS.len()])
        };
        draw_disc(&mut canvas, (px, py), radius, color);

        if (settings.show_labels || active) && px >= 0 && py >= 0 {
            labels.push(Label {
                col: (px / 2) as u16 + 2,
                row: (py / 4) as u16,
                text: loc.name.to_string(),
                color: if active { Color::White } else { Color::Gray },
                emphasised: active,
            });
        }
    }

    if let Some(ring) = layer.halo().and_then(|h| h.ring()) {
        let points = ring.iter().map(|&(lat, lng)| vp.project(lat, lng));
        draw_polyline(&mut canvas, points, width as i32, HALO_COLOR);
    }

    if let Some(bursts) = layer.bursts() {
        for burst in bursts.bursts() {
            draw_burst(&mut canvas, burst, &vp, now);
        }
    }

    GlobeFrame { canvas, labels }
}

fn draw_stars(canvas: &mut BrailleCanvas, layer: &GlobeLayer, vp: &GlobeViewport, elapsed: u64) {
    let (sin_r, cos_r) = layer.star_rotation().sin_cos();
    let global = STAR_OPACITY + STAR_TWINKLE * (elapsed as f64 * 0.0015).sin();

    for (i, star) in layer.stars().iter().enumerate() {
        // Starfield spins about the polar axis
        let p = DVec3::new(
            star.x * cos_r - star.y * sin_r,
            star.x * sin_r + star.y * cos_r,
            star.z,
        );
        let Some((px, py)) = vp.project_scene(p) else {
            continue;
        };
        let flicker = unit_noise(hash2(i as u64, elapsed / 250)) * 0.2 - 0.1;
        let brightness = (global + flicker).clamp(0.0, 1.0) * star.size / 2.0;
        let color = if brightness > 0.6 {
            Color::White
        } else if brightness > 0.35 {
            Color::Gray
        } else {
            Color::DarkGray
        };
        canvas.set_pixel_signed(px, py, color);
    }
}

fn draw_arcs(canvas: &mut BrailleCanvas, layer: &GlobeLayer, vp: &GlobeViewport, elapsed: u64) {
    let travel = (elapsed % DASH_CYCLE_MS) as f64 / DASH_CYCLE_MS as f64;
    let period = DASH_LENGTH + DASH_GAP;
    let max_jump = vp.width as i32 / 2;

    for (k, arc) in layer.arcs().iter().enumerate() {
        let start = (arc.start_lat, arc.start_lng);
        let end = (arc.end_lat, arc.end_lng);
        let angle = latlng_to_vec3(start.0, start.1)
            .dot(latlng_to_vec3(end.0, end.1))
            .clamp(-1.0, 1.0)
            .acos();
        // Longer arcs fly higher
        let peak = 0.5 * angle / PI;
        let initial_gap = unit_noise(hash2(k as u64, 0));

        let mut prev: Option<(i32, i32)> = None;
        walk_great_circle(start, end, |t, lat, lng| {
            let in_dash = (t - travel - initial_gap).rem_euclid(period) < DASH_LENGTH;
            let point = if in_dash {
                vp.project_lifted(lat, lng, peak * (PI * t).sin())
            } else {
                None
            };
            if let (Some(a), Some(b)) = (prev, point) {
                if (a.0 - b.0).abs() + (a.1 - b.1).abs() <= max_jump
                    && vp.segment_might_be_visible(a, b)
                {
                    draw_line(canvas, a, b, arc.color);
                }
            }
            prev = point;
        });
    }
}

fn draw_pulse_rings(canvas: &mut BrailleCanvas, layer: &GlobeLayer, vp: &GlobeViewport, elapsed: u64) {
    let max_jump = vp.width as i32;
    for (i, loc) in layer.locations().iter().enumerate() {
        if vp.project(loc.lat, loc.lng).is_none() {
            continue;
        }
        // Stagger the pulses so they do not beat in unison
        let phase = ((elapsed + i as u64 * 97) % RING_PERIOD_MS) as f64 / RING_PERIOD_MS as f64;
        let radius = RING_MAX_RADIUS_DEG * phase;
        if radius < 0.5 {
            continue;
        }
        let color = COLORS[(i * 3 + 1) % COLORS.len()];
        let ring = small_circle(loc.lat, loc.lng, radius, 24);
        draw_polyline(canvas, ring.iter().map(|&(lat, lng)| vp.project(lat, lng)), max_jump, color);
    }
}

fn draw_burst(canvas: &mut BrailleCanvas, burst: &Burst, vp: &GlobeViewport, now: Instant) {
    let progress = burst.progress(now);
    let color = if progress < 0.4 {
        Color::LightYellow
    } else if progress < 0.75 {
        Color::Rgb(0xff, 0x88, 0x00)
    } else {
        Color::DarkGray
    };
    for (lat, lng) in burst.particle_positions(now) {
        if let Some((px, py)) = vp.project_lifted(lat, lng, 0.02) {
            canvas.set_pixel_signed(px, py, color);
        }
    }
}
