use glam::{vec2, Mat4, Vec2};
use tracing::debug;

use crate::config::ShipConfig;
use crate::error::{HeliumError, Result};
use crate::input::{Control, InputState};
use crate::physics::{ClampedAxes, PhysicsBody};
use crate::rendering::atlas::TextureRef;
use crate::rendering::transform::Transform;
use crate::tiles::{BehaviorId, CellContext};
use crate::universe::{DrawCommand, Universe};

/// The ship: a fixed-size grid of cells, each optionally pointing at a
/// behavior in the universe's pool, flown as a single point mass.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<BehaviorId>>,
    textures: Vec<TextureRef>,
    body: PhysicsBody,
    /// Heading in radians, zero facing +y.
    rotation: f32,
    turn_rate: f32,
    speed: f32,
    max_bound: f32,
}

/// Number of cells in a `width × height` grid, computed without `u32` overflow.
fn cell_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

impl TileGrid {
    pub fn new(width: u32, height: u32, config: &ShipConfig) -> Self {
        let len = cell_count(width, height);
        Self {
            width,
            height,
            cells: vec![None; len],
            textures: vec![TextureRef::NULL; len],
            body: PhysicsBody::new(config.mass),
            rotation: 0.0,
            turn_rate: config.turn_rate_degrees.to_radians(),
            speed: config.speed,
            max_bound: config.max_bound,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn body(&self) -> &PhysicsBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut PhysicsBody {
        &mut self.body
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Texture references written by the last render, row-major.
    pub fn textures(&self) -> &[TextureRef] {
        &self.textures
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Behavior at `(x, y)`. Out-of-range coordinates read as empty.
    pub fn get(&self, x: u32, y: u32) -> Option<BehaviorId> {
        self.index(x, y).and_then(|index| self.cells[index])
    }

    pub fn set(&mut self, x: u32, y: u32, behavior: Option<BehaviorId>) -> Result<()> {
        let index = self.index(x, y).ok_or(HeliumError::CellOutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = behavior;
        Ok(())
    }

    /// Reallocates the grid, keeping the overlapping top-left rectangle.
    pub fn resize(&mut self, width: u32, height: u32) {
        let len = cell_count(width, height);
        let mut cells = vec![None; len];
        let keep_w = self.width.min(width) as usize;
        let keep_h = self.height.min(height);

        for y in 0..keep_h {
            let old_row = y as usize * self.width as usize;
            let new_row = y as usize * width as usize;
            cells[new_row..new_row + keep_w].copy_from_slice(&self.cells[old_row..old_row + keep_w]);
        }

        debug!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "grid resized"
        );
        self.cells = cells;
        self.textures = vec![TextureRef::NULL; len];
        self.width = width;
        self.height = height;
    }

    /// Applies turn and thrust controls for `dt` seconds.
    pub fn steer(&mut self, input: &InputState, dt: f32) {
        if input.is_active(Control::TurnLeft) {
            self.rotation += self.turn_rate * dt;
        }
        if input.is_active(Control::TurnRight) {
            self.rotation -= self.turn_rate * dt;
        }

        let mut thrust = 0.0;
        if input.is_active(Control::ThrustForward) {
            thrust += self.speed;
        }
        if input.is_active(Control::ThrustBackward) {
            thrust -= self.speed;
        }
        self.body.accelerate(self.forward() * thrust, dt);
    }

    /// Unit vector the nose points at.
    pub fn forward(&self) -> Vec2 {
        vec2(-self.rotation.sin(), self.rotation.cos())
    }

    pub fn integrate(&mut self, dt: f32) -> ClampedAxes {
        self.body.integrate(dt);
        self.body.clamp_to_bounds(self.max_bound)
    }

    /// Grid-local to world: cell `(x, y)` covers `[x, x+1] × [y, y+1]` before
    /// the grid is centred on the body and rotated.
    pub fn model_transform(&self) -> Mat4 {
        Transform::from_angle_and_translation(self.rotation, self.body.position)
            .with_origin(vec2(-(self.width as f32) / 2.0, -(self.height as f32) / 2.0))
            .matrix()
    }

    /// Flies the ship for the current frame, updates every cell and records a
    /// single batched draw of the grid.
    pub fn render(&mut self, universe: &mut Universe) -> Result<()> {
        let (behaviors, mut frame) = universe.frame_parts()?;

        self.steer(frame.input, frame.dt);
        self.integrate(frame.dt);

        let model = self.model_transform();
        let ship_velocity = self.body.velocity;

        for y in 0..self.height {
            for x in 0..self.width {
                let index = y as usize * self.width as usize + x as usize;
                self.textures[index] = match self.cells[index] {
                    Some(id) => {
                        let behavior = behaviors
                            .get(id)
                            .ok_or(HeliumError::UnknownBehavior(id.index()))?;
                        let cell = CellContext {
                            x,
                            y,
                            index,
                            transform: model,
                            heading: self.rotation,
                            ship_velocity,
                        };
                        behavior.update_cell(&cell, &mut frame)
                    }
                    None => TextureRef::NULL,
                };
            }
        }

        frame.draws.push(DrawCommand::Grid {
            transform: frame.view * model,
            width: self.width,
            height: self.height,
            textures: self.textures.clone(),
        });
        Ok(())
    }
}
