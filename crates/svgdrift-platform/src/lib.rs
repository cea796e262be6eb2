//! Host-side collaborators for `svgdrift-core`: an in-memory surface,
//! animation executors and a real-time driver thread.

mod executor;
mod runner;
mod surface;

pub use executor::{JsonExecutor, TracingExecutor};
pub use runner::{Runner, RunnerCommand, RunnerStatus};
pub use surface::{HeadlessSurface, SlotId, SurfaceRect};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
