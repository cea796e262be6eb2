//! Particle settings (parsed from TOML) and the validated configuration

use std::time::Duration;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::random;

/// Per-channel color jitter applied around the base color.
pub const COLOR_JITTER: f32 = 5.0;

/// Settings as they arrive from a host, every field optional.
///
/// Nothing is defaulted: [`ParticleSettings::validate`] reports all absent
/// fields at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    // Size, by width and aspect ratio
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,

    // Size, by scale factor against a fixed base size
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,

    // Color
    pub r: Option<f64>,
    pub g: Option<f64>,
    pub b: Option<f64>,
    pub min_opacity: Option<f64>,
    pub max_opacity: Option<f64>,

    // Speed
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,

    // Lifetime in milliseconds
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,

    pub max_particles: Option<u32>,

    /// Milliseconds between two spawn attempts
    pub timeout: Option<u64>,

    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Inclusive-ish sampling range; samples land in `[min, max)` or exactly
/// on `min` when both ends are equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        random::uniform(rng, self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a particle's on-screen size is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingMode {
    /// Sample a width; height follows from the template aspect ratio.
    ByWidthAndAspectRatio { width: Range },
    /// Fixed base size multiplied by a sampled scale factor.
    ByScaleFactor { width: f32, height: f32, scale: Range },
}

/// Immutable tuning for one engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub sizing: SizingMode,
    /// Base color, channels in `[0, 255]`
    pub base_color: Vec3,
    pub opacity: Range,
    pub speed: Range,
    /// Lifetime range in milliseconds
    pub lifetime: Range,
    pub max_particles: usize,
    /// Period of the spawn tick
    pub timeout: Duration,
    pub seed: Option<u64>,
}

impl ParticleSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Single structural pass: collects every missing field, then checks
    /// that the present ones are usable.
    pub fn validate(&self) -> Result<Configuration, ConfigError> {
        let mut fields = FieldCollector::default();

        let sizing = self.sizing(&mut fields);
        let r = fields.number("r", self.r);
        let g = fields.number("g", self.g);
        let b = fields.number("b", self.b);
        let min_opacity = fields.number("min_opacity", self.min_opacity);
        let max_opacity = fields.number("max_opacity", self.max_opacity);
        let min_speed = fields.number("min_speed", self.min_speed);
        let max_speed = fields.number("max_speed", self.max_speed);
        let min_duration = fields.number("min_duration", self.min_duration);
        let max_duration = fields.number("max_duration", self.max_duration);
        let max_particles = fields.present("max_particles", self.max_particles);
        let timeout = fields.present("timeout", self.timeout);

        fields.finish()?;

        if max_particles == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_particles",
            });
        }
        if timeout == 0 {
            return Err(ConfigError::NotPositive { field: "timeout" });
        }
        let durations = [("min_duration", min_duration), ("max_duration", max_duration)];
        for (field, millis) in durations {
            if lifetime(millis).is_none() {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::from(millis),
                });
            }
        }

        Ok(Configuration {
            sizing,
            base_color: Vec3::new(r, g, b),
            opacity: Range::new(min_opacity, max_opacity),
            speed: Range::new(min_speed, max_speed),
            lifetime: Range::new(min_duration, max_duration),
            max_particles: max_particles as usize,
            timeout: Duration::from_millis(timeout),
            seed: self.seed,
        })
    }

    fn sizing(&self, fields: &mut FieldCollector) -> SizingMode {
        // The width group wins as soon as one of its fields is present
        let width_touched = self.min_width.is_some() || self.max_width.is_some();
        let scale_touched = [self.width, self.height, self.min_scale, self.max_scale]
            .iter()
            .any(Option::is_some);

        if width_touched || !scale_touched {
            SizingMode::ByWidthAndAspectRatio {
                width: Range::new(
                    fields.number("min_width", self.min_width),
                    fields.number("max_width", self.max_width),
                ),
            }
        } else {
            SizingMode::ByScaleFactor {
                width: fields.number("width", self.width),
                height: fields.number("height", self.height),
                scale: Range::new(
                    fields.number("min_scale", self.min_scale),
                    fields.number("max_scale", self.max_scale),
                ),
            }
        }
    }
}

/// Lifetime in milliseconds as a [`Duration`]. Negative values clamp to
/// zero; `None` when the value does not fit.
pub fn lifetime(millis: f32) -> Option<Duration> {
    Duration::try_from_secs_f64(f64::from(millis.max(0.0)) / 1000.0).ok()
}

impl TryFrom<&ParticleSettings> for Configuration {
    type Error = ConfigError;

    fn try_from(settings: &ParticleSettings) -> Result<Self, Self::Error> {
        settings.validate()
    }
}

#[derive(Default)]
struct FieldCollector {
    missing: Vec<&'static str>,
    non_finite: Option<(&'static str, f64)>,
}

impl FieldCollector {
    fn number(&mut self, field: &'static str, value: Option<f64>) -> f32 {
        match value {
            Some(v) => {
                // Values beyond f32 range narrow to infinity
                let narrowed = v as f32;
                if !narrowed.is_finite() && self.non_finite.is_none() {
                    self.non_finite = Some((field, v));
                }
                narrowed
            }
            None => {
                self.missing.push(field);
                0.0
            }
        }
    }

    fn present<T: Default>(&mut self, field: &'static str, value: Option<T>) -> T {
        value.unwrap_or_else(|| {
            self.missing.push(field);
            T::default()
        })
    }

    fn finish(self) -> Result<(), ConfigError> {
        if !self.missing.is_empty() {
            return Err(ConfigError::Incomplete {
                missing: self.missing,
            });
        }
        if let Some((field, value)) = self.non_finite {
            return Err(ConfigError::NotFinite { field, value });
        }
        Ok(())
    }
}
