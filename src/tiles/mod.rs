//! Pluggable cell behaviors.
//!
//! A grid cell holds a [`BehaviorId`] into the [`BehaviorPool`] owned by the
//! universe, so one behavior instance can back any number of cells across any
//! number of grids. Once per frame each occupied cell calls
//! [`TileBehavior::update_cell`], which picks the texture for that cell and may
//! emit lights, particles or overlay draws.

pub mod engine;
pub mod plating;
pub mod turret;

use glam::{Mat4, Vec2};

use crate::rendering::atlas::TextureRef;
use crate::universe::FrameContext;

pub use engine::Engine;
pub use plating::Plating;
pub use turret::{Turret, TurretAim};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct BehaviorId(u32);

impl BehaviorId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// What a behavior knows about the cell it is updating.
#[derive(Debug, Copy, Clone)]
pub struct CellContext {
    pub x: u32,
    pub y: u32,
    /// Linear slot of the cell inside its grid.
    pub index: usize,
    /// Grid-local to world transform of the owning grid.
    pub transform: Mat4,
    /// Heading of the owning grid in radians.
    pub heading: f32,
    pub ship_velocity: Vec2,
}

impl CellContext {
    /// World transform of this cell's unit square.
    pub fn cell_transform(&self) -> Mat4 {
        crate::rendering::transform::translated(self.transform, Vec2::new(self.x as f32, self.y as f32))
    }
}

#[derive(Debug, Clone)]
pub enum TileBehavior {
    Plating(Plating),
    Engine(Engine),
    Turret(Turret),
}

impl TileBehavior {
    pub fn update_cell(&self, cell: &CellContext, frame: &mut FrameContext) -> TextureRef {
        match self {
            TileBehavior::Plating(plating) => plating.update_cell(cell, frame),
            TileBehavior::Engine(engine) => engine.update_cell(cell, frame),
            TileBehavior::Turret(turret) => turret.update_cell(cell, frame),
        }
    }
}

impl From<Plating> for TileBehavior {
    fn from(plating: Plating) -> Self {
        TileBehavior::Plating(plating)
    }
}

impl From<Engine> for TileBehavior {
    fn from(engine: Engine) -> Self {
        TileBehavior::Engine(engine)
    }
}

impl From<Turret> for TileBehavior {
    fn from(turret: Turret) -> Self {
        TileBehavior::Turret(turret)
    }
}

/// Owns every behavior instance. Behaviors are never removed, so ids stay valid
/// for the pool's lifetime.
#[derive(Debug, Default, Clone)]
pub struct BehaviorPool {
    behaviors: Vec<TileBehavior>,
}

impl BehaviorPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, behavior: impl Into<TileBehavior>) -> BehaviorId {
        self.behaviors.push(behavior.into());
        BehaviorId((self.behaviors.len() - 1) as u32)
    }

    pub fn get(&self, id: BehaviorId) -> Option<&TileBehavior> {
        self.behaviors.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}
