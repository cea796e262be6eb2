//! Builds particles: a recolored template clone plus the plan that animates it

use std::time::Duration;

use glam::Vec2;
use rand::Rng;

use crate::color::Rgba;
use crate::config::{self, Configuration, SizingMode};
use crate::error::TemplateError;
use crate::plan::AnimationPlan;
use crate::random::{split_speed, uniform};
use crate::template::{ShapeHandle, Template};

/// Resolved size of one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleSize {
    /// Pixel size, height derived from the template aspect ratio
    Dimensions(Vec2),
    /// Fixed base size scaled by the animation transform
    Scaled { base: Vec2, scale: f32 },
}

impl ParticleSize {
    /// Size the shape element is laid out with
    pub fn base(&self) -> Vec2 {
        match *self {
            ParticleSize::Dimensions(size) => size,
            ParticleSize::Scaled { base, .. } => base,
        }
    }

    pub fn scale(&self) -> f32 {
        match *self {
            ParticleSize::Dimensions(_) => 1.0,
            ParticleSize::Scaled { scale, .. } => scale,
        }
    }
}

/// Everything sampled for one particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub size: ParticleSize,
    pub color: Rgba,
    /// Percent of the container bounds, each axis in `[0, 100)`
    pub spawn: Vec2,
    /// Degrees in `[0, 360)`
    pub rotation: f32,
    /// Pixels travelled over the lifetime
    pub motion: Vec2,
    pub lifetime: Duration,
}

/// Output of [`ParticleFactory::create`]
#[derive(Debug, Clone)]
pub struct Spawned {
    pub shape: ShapeHandle,
    pub particle: Particle,
    pub plan: AnimationPlan,
}

pub struct ParticleFactory {
    template: Template,
    config: Configuration,
}

impl ParticleFactory {
    pub fn new(template: Template, config: Configuration) -> Self {
        Self { template, config }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Clone the template and give the clone its own random identity.
    ///
    /// Fails when the clone has nothing to recolor.
    pub fn create<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Spawned, TemplateError> {
        let config = &self.config;
        let mut shape = self.template.clone_shape();

        let size = match config.sizing {
            SizingMode::ByWidthAndAspectRatio { width } => {
                let width = width.sample(rng);
                ParticleSize::Dimensions(Vec2::new(width, width * self.template.aspect_ratio()))
            }
            SizingMode::ByScaleFactor {
                width,
                height,
                scale,
            } => ParticleSize::Scaled {
                base: Vec2::new(width, height),
                scale: scale.sample(rng),
            },
        };

        let color = Rgba::jittered(rng, config.base_color, config.opacity);
        let spawn = Vec2::new(uniform(rng, 0.0, 100.0), uniform(rng, 0.0, 100.0));
        let rotation = uniform(rng, 0.0, 360.0);
        let speed = config.speed.sample(rng);
        let motion = split_speed(rng, speed);
        // Validated configurations always fit; hand-built ones saturate
        let lifetime = config::lifetime(config.lifetime.sample(rng)).unwrap_or(Duration::MAX);

        shape.set_fill(color)?;
        shape.set_size(size.base());
        shape.set_position(spawn);

        let plan = AnimationPlan::drift(rotation, size.scale(), motion, lifetime);

        Ok(Spawned {
            shape,
            particle: Particle {
                size,
                color,
                spawn,
                rotation,
                motion,
                lifetime,
            },
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParticleSettings, Range, COLOR_JITTER};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SHAPE: &str = r#"<svg viewBox="0 0 20 10"><path d="M0 0h20v10z"/></svg>"#;

    fn settings() -> ParticleSettings {
        ParticleSettings {
            min_width: Some(10.0),
            max_width: Some(50.0),
            r: Some(100.0),
            g: Some(150.0),
            b: Some(200.0),
            min_opacity: Some(0.5),
            max_opacity: Some(0.9),
            min_speed: Some(10.0),
            max_speed: Some(30.0),
            min_duration: Some(1000.0),
            max_duration: Some(2000.0),
            max_particles: Some(100),
            timeout: Some(50),
            ..Default::default()
        }
    }

    fn factory(settings: &ParticleSettings) -> ParticleFactory {
        ParticleFactory::new(Template::load(SHAPE).unwrap(), settings.validate().unwrap())
    }

    #[test]
    fn sampled_values_stay_in_bounds() {
        let factory = factory(&settings());
        let config = factory.config().clone();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let Spawned {
                shape,
                particle,
                plan,
            } = factory.create(&mut rng).unwrap();

            let width = particle.size.base().x;
            assert!((10.0..=50.0).contains(&width));
            assert!((particle.color.r - 100.0).abs() <= COLOR_JITTER);
            assert!((particle.color.g - 150.0).abs() <= COLOR_JITTER);
            assert!((particle.color.b - 200.0).abs() <= COLOR_JITTER);
            assert!(config.opacity.contains(particle.color.a));
            assert!((0.0..=100.0).contains(&particle.spawn.x));
            assert!((0.0..=100.0).contains(&particle.spawn.y));
            assert!((0.0..=360.0).contains(&particle.rotation));
            assert!(particle.motion.length() <= 30.0 + 1e-3);

            let ms = particle.lifetime.as_secs_f64() * 1000.0;
            assert!((999.9..=2000.1).contains(&ms), "lifetime {ms}");
            assert_eq!(plan.duration, particle.lifetime);

            assert_eq!(shape.style().fill, Some(particle.color));
            assert_eq!(shape.style().left, particle.spawn.x);
        }
    }

    #[test]
    fn fixed_width_follows_aspect_ratio() {
        let mut settings = settings();
        settings.min_width = Some(20.0);
        settings.max_width = Some(20.0);
        let factory = factory(&settings);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let spawned = factory.create(&mut rng).unwrap();
            assert_eq!(
                spawned.particle.size,
                ParticleSize::Dimensions(Vec2::new(20.0, 40.0))
            );
            assert_eq!(spawned.shape.style().width, 20.0);
            assert_eq!(spawned.shape.style().height, 40.0);
        }
    }

    #[test]
    fn scale_mode_keeps_base_size() {
        let mut settings = settings();
        settings.min_width = None;
        settings.max_width = None;
        settings.width = Some(16.0);
        settings.height = Some(8.0);
        settings.min_scale = Some(0.5);
        settings.max_scale = Some(1.5);
        let factory = factory(&settings);
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..100 {
            let spawned = factory.create(&mut rng).unwrap();
            let ParticleSize::Scaled { base, scale } = spawned.particle.size else {
                panic!("expected scaled particle");
            };
            assert_eq!(base, Vec2::new(16.0, 8.0));
            assert!(Range::new(0.5, 1.5).contains(scale));
            let first = spawned.plan.keyframes[0].transform.unwrap();
            assert_eq!(first.scale, scale);
        }
    }

    #[test]
    fn unfillable_clone_fails() {
        let template =
            Template::load_unchecked(r#"<svg viewBox="0 0 1 1"><rect width="1"/></svg>"#).unwrap();
        let factory = ParticleFactory::new(template, settings().validate().unwrap());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            factory.create(&mut rng).unwrap_err(),
            TemplateError::MissingFillablePart
        );
    }

    #[test]
    fn oversized_hand_built_lifetime_saturates() {
        let mut config = settings().validate().unwrap();
        config.lifetime = Range::new(1e23, 1e23);
        let factory = ParticleFactory::new(Template::load(SHAPE).unwrap(), config);
        let spawned = factory.create(&mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(spawned.particle.lifetime, Duration::MAX);
        assert_eq!(spawned.plan.duration, Duration::MAX);
    }
}
