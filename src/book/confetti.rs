use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

pub const CONFETTI_PARTICLES: usize = 90;
/// Cone half-width, degrees either side of straight up.
const SPREAD_DEG: f64 = 35.0;
/// Launch point as a fraction of the area height.
const ORIGIN_Y: f64 = 0.3;
const LIFETIME: Duration = Duration::from_millis(2500);
/// Area heights per second squared.
const GRAVITY: f64 = 1.6;

const COLORS: [Color; 6] = [
    Color::Rgb(0x26, 0xcc, 0xff),
    Color::Rgb(0xa2, 0x5a, 0xfd),
    Color::Rgb(0xff, 0x5e, 0x7e),
    Color::Rgb(0x88, 0xff, 0x5a),
    Color::Rgb(0xfc, 0xff, 0x42),
    Color::Rgb(0xff, 0xa6, 0x2d),
];

struct Piece {
    vx: f64,
    vy: f64,
    color: Color,
}

/// One-shot celebratory burst in screen space (0..1 on both axes).
pub struct Confetti {
    born: Instant,
    pieces: Vec<Piece>,
}

impl Confetti {
    pub fn launch(seed: u64, now: Instant) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pieces = (0..CONFETTI_PARTICLES)
            .map(|i| {
                let angle = (rng.random::<f64>() * 2.0 - 1.0) * SPREAD_DEG.to_radians();
                let speed = 0.6 + rng.random::<f64>() * 0.6;
                Piece {
                    vx: angle.sin() * speed * 0.5,
                    vy: -angle.cos() * speed,
                    color: COLORS[i % COLORS.len()],
                }
            })
            .collect();
        Self { born: now, pieces }
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.born) >= LIFETIME
    }

    /// Positions still inside the unit square at `now`.
    pub fn positions(&self, now: Instant) -> impl Iterator<Item = (f64, f64, Color)> + '_ {
        let t = now.saturating_duration_since(self.born).as_secs_f64();
        self.pieces.iter().filter_map(move |p| {
            let x = 0.5 + p.vx * t;
            let y = ORIGIN_Y + p.vy * t + 0.5 * GRAVITY * t * t;
            ((0.0..1.0).contains(&x) && (0.0..1.0).contains(&y)).then_some((x, y, p.color))
        })
    }
}
