//! RGBA fill colors

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Range, COLOR_JITTER};
use crate::random;

/// Color with channels in `[0, 255]` and alpha in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Jitters each channel of `base` by up to ±[`COLOR_JITTER`] and samples
    /// alpha from `opacity`. Channels are clamped to `[0, 255]`.
    pub fn jittered<R: Rng + ?Sized>(rng: &mut R, base: Vec3, opacity: Range) -> Self {
        let mut channel = |value: f32| {
            random::uniform(rng, value - COLOR_JITTER, value + COLOR_JITTER).clamp(0.0, 255.0)
        };
        let (r, g, b) = (channel(base.x), channel(base.y), channel(base.z));
        Self {
            r,
            g,
            b,
            a: opacity.sample(rng),
        }
    }

    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn jitter_stays_near_base() {
        let mut rng = StdRng::seed_from_u64(5);
        let base = Vec3::new(120.0, 60.0, 200.0);
        let opacity = Range::new(0.5, 0.9);
        for _ in 0..500 {
            let c = Rgba::jittered(&mut rng, base, opacity);
            assert!((c.r - base.x).abs() <= COLOR_JITTER);
            assert!((c.g - base.y).abs() <= COLOR_JITTER);
            assert!((c.b - base.z).abs() <= COLOR_JITTER);
            assert!(opacity.contains(c.a));
        }
    }

    #[test]
    fn jitter_is_clamped_at_channel_limits() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..500 {
            let c = Rgba::jittered(&mut rng, Vec3::new(255.0, 0.0, 2.0), Range::new(1.0, 1.0));
            assert!(c.r <= 255.0 && c.r >= 250.0);
            assert!(c.g >= 0.0 && c.g <= 5.0);
            assert!(c.b >= 0.0);
        }
    }

    #[test]
    fn css_format() {
        assert_eq!(
            Rgba::new(255.0, 0.0, 12.5, 0.5).to_css(),
            "rgba(255, 0, 12.5, 0.5)"
        );
    }
}
