//! Stateless sampling helpers over any `rand::Rng`

use glam::Vec2;
use rand::Rng;

/// Linear interpolation of a `[0, 1)` sample into `[min, max)`.
///
/// Unlike `gen_range` this accepts `min == max` (always returns `min`) and
/// never panics on an inverted range.
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}

/// Returns `value` or `-value` with equal probability
#[inline]
pub fn sign_flip<R: Rng + ?Sized>(rng: &mut R, value: f32) -> f32 {
    if rng.gen_bool(0.5) {
        value
    } else {
        -value
    }
}

/// Splits a speed magnitude into a motion vector.
///
/// `dx` is sampled uniformly in `[0, speed)` and truncated, `dy` is the
/// truncated remainder `floor(sqrt(speed² - dx²))`, then each axis is
/// sign-flipped independently. The magnitude is therefore at most `speed`.
///
/// Sampling `dx` by magnitude rather than sampling an angle biases motion
/// toward the axes. That distribution is intended.
pub fn split_speed<R: Rng + ?Sized>(rng: &mut R, speed: f32) -> Vec2 {
    let speed = speed.max(0.0);
    let dx = uniform(rng, 0.0, speed).floor();
    let dy = (speed * speed - dx * dx).max(0.0).sqrt().floor();
    Vec2::new(sign_flip(rng, dx), sign_flip(rng, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = uniform(&mut rng, 10.0, 50.0);
            assert!((10.0..=50.0).contains(&v));
        }
    }

    #[test]
    fn uniform_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(uniform(&mut rng, 20.0, 20.0), 20.0);
        }
    }

    #[test]
    fn split_speed_never_exceeds_speed() {
        let mut rng = StdRng::seed_from_u64(123);
        for i in 0..2000 {
            let speed = 1.0 + (i % 50) as f32 * 0.7;
            let motion = split_speed(&mut rng, speed);
            assert!(motion.length_squared() <= speed * speed + 1e-3);
            assert_eq!(motion.x, motion.x.trunc());
            assert_eq!(motion.y, motion.y.trunc());
        }
    }

    #[test]
    fn split_speed_signs_are_balanced() {
        let mut rng = StdRng::seed_from_u64(99);
        let samples = 4000;
        let (mut neg_x, mut neg_y) = (0, 0);
        for _ in 0..samples {
            // speed 30 keeps both axes nonzero often enough to observe signs
            let motion = split_speed(&mut rng, 30.0);
            if motion.x.is_sign_negative() {
                neg_x += 1;
            }
            if motion.y.is_sign_negative() {
                neg_y += 1;
            }
        }
        for negatives in [neg_x, neg_y] {
            let ratio = negatives as f32 / samples as f32;
            assert!((0.45..=0.55).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn split_speed_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(split_speed(&mut rng, 0.0).length(), 0.0);
    }
}
