//! Declarative keyframe plans handed to the animation executor

use std::time::Duration;

use glam::Vec2;
use serde::{Serialize, Serializer};

/// Number of full-opacity keyframes between the fade-in and fade-out.
/// Holding opacity at 1 across these pushes the fades to the edges of the
/// lifetime.
pub const OPACITY_HOLDS: usize = 5;

/// Transform of a shape relative to its centered spawn point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    /// Pixels
    pub translate: Vec2,
    /// Degrees
    pub rotate: f32,
    pub scale: f32,
}

impl Transform {
    pub fn lerp(self, other: Transform, t: f32) -> Transform {
        Transform {
            translate: self.translate.lerp(other.translate, t),
            rotate: lerp_f32(self.rotate, other.rotate, t),
            scale: lerp_f32(self.scale, other.scale, t),
        }
    }

    /// CSS transform, centering the shape on its spawn point
    pub fn to_css(&self) -> String {
        let mut css = format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px)) rotate({}deg)",
            self.translate.x, self.translate.y, self.rotate
        );
        if self.scale != 1.0 {
            css.push_str(&format!(" scale({})", self.scale));
        }
        css
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keyframe {
    /// Position in `[0, 1]` along the animation
    pub offset: f32,
    /// Keyframes without a transform inherit the interpolated one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub opacity: f32,
}

/// Interpolated state at some point of a plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub transform: Transform,
    pub opacity: f32,
}

/// Keyframes plus timing, played once by the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationPlan {
    pub keyframes: Vec<Keyframe>,
    #[serde(rename = "duration_ms", serialize_with = "millis")]
    pub duration: Duration,
    pub iterations: u32,
}

impl AnimationPlan {
    /// Fade in at the spawn point, hold, and fade out after moving by
    /// `motion`. Rotation and scale stay constant.
    pub fn drift(rotation: f32, scale: f32, motion: Vec2, duration: Duration) -> Self {
        let start = Transform {
            translate: Vec2::ZERO,
            rotate: rotation,
            scale,
        };
        let end = Transform {
            translate: motion,
            ..start
        };

        let last = (OPACITY_HOLDS + 1) as f32;
        let mut keyframes = Vec::with_capacity(OPACITY_HOLDS + 2);
        keyframes.push(Keyframe {
            offset: 0.0,
            transform: Some(start),
            opacity: 0.0,
        });
        for i in 1..=OPACITY_HOLDS {
            keyframes.push(Keyframe {
                offset: i as f32 / last,
                transform: None,
                opacity: 1.0,
            });
        }
        keyframes.push(Keyframe {
            offset: 1.0,
            transform: Some(end),
            opacity: 0.0,
        });

        Self {
            keyframes,
            duration,
            iterations: 1,
        }
    }

    /// Sample the plan at `progress` in `[0, 1]`
    pub fn sample(&self, progress: f32) -> Frame {
        let progress = progress.clamp(0.0, 1.0);

        let opacities: Vec<(f32, f32)> = self
            .keyframes
            .iter()
            .map(|k| (k.offset, k.opacity))
            .collect();
        let transforms: Vec<(f32, Transform)> = self
            .keyframes
            .iter()
            .filter_map(|k| k.transform.map(|t| (k.offset, t)))
            .collect();

        Frame {
            transform: interpolate(&transforms, progress, Transform::lerp).unwrap_or(Transform {
                translate: Vec2::ZERO,
                rotate: 0.0,
                scale: 1.0,
            }),
            opacity: interpolate(&opacities, progress, lerp_f32).unwrap_or(1.0),
        }
    }

    /// Sample the plan `elapsed` after it started playing
    pub fn sample_at(&self, elapsed: Duration) -> Frame {
        if self.duration.is_zero() {
            return self.sample(1.0);
        }
        self.sample((elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32)
    }
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn interpolate<T: Copy>(points: &[(f32, T)], at: f32, lerp: impl Fn(T, T, f32) -> T) -> Option<T> {
    let (&first, rest) = points.split_first()?;
    if at <= first.0 {
        return Some(first.1);
    }
    let mut previous = first;
    for &next in rest {
        if at <= next.0 {
            let span = next.0 - previous.0;
            let t = if span > 0.0 { (at - previous.0) / span } else { 1.0 };
            return Some(lerp(previous.1, next.1, t));
        }
        previous = next;
    }
    Some(previous.1)
}

fn millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
