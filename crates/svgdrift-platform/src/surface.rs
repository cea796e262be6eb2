use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use svgdrift_core::{Container, HostResult, ShapeHandle};
use tracing::{debug, info};

/// Pixel bounds of a surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Reference to a shape inserted into a [`HeadlessSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u64);

/// Container with no display: keeps inserted shapes in memory.
pub struct HeadlessSurface {
    bounds: SurfaceRect,
    shapes: BTreeMap<SlotId, ShapeHandle>,
    next_slot: u64,
    inserted: u64,
    removed: u64,
    measured: Option<Vec2>,
}

impl HeadlessSurface {
    pub fn new(bounds: SurfaceRect) -> Self {
        Self {
            bounds,
            shapes: BTreeMap::new(),
            next_slot: 0,
            inserted: 0,
            removed: 0,
            measured: None,
        }
    }

    /// Report `size` as the laid-out size of any shape
    pub fn with_measurement(mut self, size: Vec2) -> Self {
        self.measured = Some(size);
        self
    }

    pub fn bounds(&self) -> SurfaceRect {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &ShapeHandle> {
        self.shapes.values()
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn removed(&self) -> u64 {
        self.removed
    }

    /// Top-left pixel position of a shape whose style places it in percent
    pub fn pixel_position(&self, shape: &ShapeHandle) -> Vec2 {
        let style = shape.style();
        Vec2::new(
            self.bounds.x as f32 + self.bounds.width as f32 * style.left / 100.0,
            self.bounds.y as f32 + self.bounds.height as f32 * style.top / 100.0,
        )
    }

    pub fn log_current_layout(&self, reason: &str) {
        let r = self.bounds;
        info!(
            "Surface layout ({}) -> origin=({}, {}), size={}x{}, {} live, {} inserted, {} removed",
            reason,
            r.x,
            r.y,
            r.width,
            r.height,
            self.shapes.len(),
            self.inserted,
            self.removed
        );
    }
}

impl Container for HeadlessSurface {
    type Ref = SlotId;

    fn insert(&mut self, shape: ShapeHandle) -> HostResult<SlotId> {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        self.inserted += 1;
        debug!("surface insert {:?}: {}", slot, shape.style().to_css());
        self.shapes.insert(slot, shape);
        Ok(slot)
    }

    fn remove(&mut self, particle: SlotId) -> HostResult<()> {
        match self.shapes.remove(&particle) {
            Some(_) => {
                self.removed += 1;
                Ok(())
            }
            None => Err(format!("no shape in slot {:?}", particle).into()),
        }
    }

    fn measure(&mut self, _shape: &ShapeHandle) -> Option<Vec2> {
        self.measured
    }
}
