use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shell bounds in globe units (globe radius = 100).
pub const SHELL_MIN: f64 = 150.0;
pub const SHELL_MAX: f64 = 250.0;

/// Decorative background star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub size: f64,
}

impl Star {
    pub fn distance(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Generate `count` stars uniformly distributed over directions, at a random
/// distance in [SHELL_MIN, SHELL_MAX).
pub fn generate_stars(count: usize, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let distance = SHELL_MIN + rng.random::<f64>() * (SHELL_MAX - SHELL_MIN);
            let theta = rng.random::<f64>() * std::f64::consts::TAU;
            // acos of a uniform [-1, 1) keeps the density uniform over the sphere
            let phi = (rng.random::<f64>() * 2.0 - 1.0).acos();

            Star {
                x: distance * phi.sin() * theta.cos(),
                y: distance * phi.sin() * theta.sin(),
                z: distance * phi.cos(),
                size: rng.random::<f64>() * 1.5 + 0.5,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_shell() {
        let stars = generate_stars(1000, 42);
        assert_eq!(stars.len(), 1000);
        for s in &stars {
            let d = s.distance();
            assert!(d >= SHELL_MIN - 1e-9 && d < SHELL_MAX + 1e-9, "distance {d}");
            assert!(s.size >= 0.5 && s.size < 2.0);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(generate_stars(16, 7), generate_stars(16, 7));
        assert_ne!(generate_stars(16, 7), generate_stars(16, 8));
    }

    #[test]
    fn test_zero_count() {
        assert!(generate_stars(0, 1).is_empty());
    }
}
