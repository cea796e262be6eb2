//! Host collaborator traits so the engine stays platform-agnostic.

use glam::Vec2;

use crate::plan::AnimationPlan;
use crate::template::ShapeHandle;

pub type HostResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Surface particles are inserted into and removed from.
pub trait Container: Send {
    /// Host-side reference to an inserted shape
    type Ref: Send;

    fn insert(&mut self, shape: ShapeHandle) -> HostResult<Self::Ref>;
    fn remove(&mut self, particle: Self::Ref) -> HostResult<()>;

    /// Laid-out size of `shape`, used when a template declares no size.
    fn measure(&mut self, _shape: &ShapeHandle) -> Option<Vec2> {
        None
    }
}

/// Plays an [`AnimationPlan`] on a shape. Fire-and-forget: the engine
/// never waits for completion and removes shapes on its own schedule.
pub trait AnimationExecutor: Send {
    fn play(&mut self, shape: &ShapeHandle, plan: &AnimationPlan) -> HostResult<()>;
}
