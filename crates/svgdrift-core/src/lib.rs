//! svgdrift core engine: platform-agnostic logic for spawning short-lived
//! animated copies of an SVG shape.
//!
//! - `config`: settings validation and sampling ranges
//! - `template`: SVG loading, aspect ratio, shape clones
//! - `factory` / `random` / `plan`: per-particle identity and keyframes
//! - `schedule` / `engine`: the tick, the capacity gate and timed removal

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod host;
pub mod plan;
pub mod random;
pub mod schedule;
pub mod template;

pub use color::Rgba;
pub use config::{Configuration, ParticleSettings, Range, SizingMode};
pub use engine::{Engine, EngineState, EngineStats, ParticleId};
pub use error::{ConfigError, EngineError, Result, TemplateError};
pub use factory::{Particle, ParticleFactory, ParticleSize, Spawned};
pub use host::{AnimationExecutor, Container, HostResult};
pub use plan::{AnimationPlan, Frame, Keyframe, Transform};
pub use template::{AspectSource, ShapeHandle, ShapeStyle, Template};
