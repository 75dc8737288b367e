use std::time::{Duration, Instant};

use crate::geo::{lon_delta, wrap_lon};

/// Fly-to transition length.
pub const FLY_DURATION: Duration = Duration::from_millis(1000);

/// A camera pose: what the view is centred on and how close it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

/// Eased interpolation between two poses, sampled once per frame.
#[derive(Debug, Clone)]
pub struct CameraTween {
    from: View,
    to: View,
    started: Instant,
    duration: Duration,
}

impl CameraTween {
    pub fn new(from: View, to: View, started: Instant, duration: Duration) -> Self {
        Self { from, to, started, duration }
    }

    pub fn target(&self) -> View {
        self.to
    }

    /// Pose at `now`, and whether the tween has finished.
    pub fn sample(&self, now: Instant) -> (View, bool) {
        let elapsed = now.saturating_duration_since(self.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, true);
        }

        let t = ease_in_out_cubic(elapsed.as_secs_f64() / self.duration.as_secs_f64());
        let view = View {
            lat: self.from.lat + (self.to.lat - self.from.lat) * t,
            // Longitude takes the short way round the antimeridian
            lng: wrap_lon(self.from.lng + lon_delta(self.from.lng, self.to.lng) * t),
            zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * t,
        };
        (view, false)
    }
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tween(from: View, to: View) -> (CameraTween, Instant) {
        let t0 = Instant::now();
        (CameraTween::new(from, to, t0, FLY_DURATION), t0)
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn test_sample_finishes_at_target() {
        let from = View { lat: 0.0, lng: 0.0, zoom: 1.0 };
        let to = View { lat: 35.0, lng: 139.0, zoom: 1.25 };
        let (tw, t0) = tween(from, to);

        let (start, done) = tw.sample(t0);
        assert!(!done);
        assert_eq!(start, from);

        let (mid, done) = tw.sample(t0 + Duration::from_millis(500));
        assert!(!done);
        assert!((mid.lat - 17.5).abs() < 1e-9);

        let (end, done) = tw.sample(t0 + Duration::from_millis(1000));
        assert!(done);
        assert_eq!(end, to);
    }

    #[test]
    fn test_crosses_antimeridian_short_way() {
        let from = View { lat: 0.0, lng: 170.0, zoom: 1.0 };
        let to = View { lat: 0.0, lng: -170.0, zoom: 1.0 };
        let (tw, t0) = tween(from, to);
        let (mid, _) = tw.sample(t0 + Duration::from_millis(500));
        assert!(mid.lng.abs() > 175.0, "went the long way: {}", mid.lng);
    }
}
