//! CPU half of the scene: frame timing, camera, free bodies and the per-frame
//! collections that tile behaviors write into.
//!
//! A frame runs `start_frame` → any number of [`TileGrid::render`] calls →
//! `post_frame`. What should be drawn is recorded as [`DrawCommand`]s, which
//! the compositor replays on the GPU afterwards.
//!
//! [`TileGrid::render`]: crate::ship::TileGrid::render

use glam::{vec2, Mat4, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::UniverseConfig;
use crate::effects::{LightAccumulator, ParticleSystem};
use crate::error::{HeliumError, Result};
use crate::input::InputState;
use crate::physics::{step_bodies, PhysicsBody};
use crate::rendering::atlas::{TextureRef, TileAtlas};
use crate::rendering::transform::view_scale;
use crate::tiles::{BehaviorId, BehaviorPool, TileBehavior};

/// Deltas above this are still simulated, but reported.
const LONG_FRAME: f32 = 0.25;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    SceneRender,
    PostFrame,
}

/// One recorded draw, in clip space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A whole tile grid in one batch. `textures` is row-major, `width * height` long.
    Grid {
        transform: Mat4,
        width: u32,
        height: u32,
        textures: Vec<TextureRef>,
    },
    /// A single unit quad, e.g. a turret gun.
    Sprite { transform: Mat4, texture: TextureRef },
}

/// Exponential moving average of the frame rate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    fps: f64,
    frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self { fps: 60.0, frames: 0 }
    }
}

impl FrameStats {
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn record(&mut self, delta: f64) {
        self.frames += 1;
        if delta <= 0.0 {
            return;
        }
        let current = 1.0 / delta;
        let a = (2.0 / self.fps).clamp(0.0, 1.0);
        self.fps = a * current + (1.0 - a) * self.fps;
    }
}

/// Everything a behavior may touch while updating one cell.
pub struct FrameContext<'a> {
    pub dt: f32,
    pub input: &'a InputState,
    /// Pixel-aspect and zoom correction, world to clip space.
    pub view: Mat4,
    /// Visible framebuffer size in pixels.
    pub framebuffer: Vec2,
    pub lights: &'a mut LightAccumulator,
    pub particles: &'a mut ParticleSystem,
    pub draws: &'a mut Vec<DrawCommand>,
    pub rng: &'a mut ChaCha8Rng,
}

pub struct Universe {
    config: UniverseConfig,
    phase: FramePhase,
    last_time: Option<f64>,
    delta: f32,
    zoom: f32,
    aspect: f32,
    framebuffer: Vec2,
    view: Mat4,
    input: InputState,
    behaviors: BehaviorPool,
    atlas: TileAtlas,
    bodies: Vec<PhysicsBody>,
    lights: LightAccumulator,
    particles: ParticleSystem,
    draws: Vec<DrawCommand>,
    rng: ChaCha8Rng,
    stats: FrameStats,
}

impl Universe {
    pub fn new(config: UniverseConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let zoom = config.camera.zoom;
        Self {
            config,
            phase: FramePhase::Idle,
            last_time: None,
            delta: 0.0,
            zoom,
            aspect: 1.0,
            framebuffer: vec2(1.0, 1.0),
            view: view_scale(1.0, zoom),
            input: InputState::default(),
            behaviors: BehaviorPool::new(),
            atlas: TileAtlas::new(),
            bodies: Vec::new(),
            lights: LightAccumulator::new(),
            particles: ParticleSystem::new(),
            draws: Vec::new(),
            rng,
            stats: FrameStats::default(),
        }
    }

    /// Opens a frame at wall-clock time `now` (seconds) for a framebuffer of
    /// the given size. The first frame has a zero delta.
    pub fn start_frame(&mut self, now: f64, framebuffer: (u32, u32)) -> Result<()> {
        if self.phase == FramePhase::SceneRender {
            return Err(HeliumError::FramePhase {
                expected: FramePhase::PostFrame,
                actual: self.phase,
            });
        }

        let delta = match self.last_time {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_time = Some(now);
        self.delta = delta as f32;
        if self.delta > LONG_FRAME {
            warn!(delta = self.delta, "long frame");
        }
        self.stats.record(delta);

        self.lights.clear();
        self.draws.clear();

        let (width, height) = framebuffer;
        self.framebuffer = vec2(width.max(1) as f32, height.max(1) as f32);
        self.aspect = self.framebuffer.x / self.framebuffer.y;
        self.view = view_scale(self.aspect, self.zoom);

        step_bodies(&mut self.bodies, self.config.physics.gravitation, self.delta);

        self.phase = FramePhase::SceneRender;
        Ok(())
    }

    /// Closes the scene part of the frame and advances the particle system.
    /// Returns the number of particles that expired.
    pub fn post_frame(&mut self) -> Result<usize> {
        self.expect_phase(FramePhase::SceneRender)?;
        let culled = self.particles.advance(self.delta);
        self.phase = FramePhase::PostFrame;
        if self.stats.frames() % 600 == 0 {
            debug!(
                fps = self.stats.fps(),
                particles = self.particles.len(),
                lights = self.lights.len(),
                "frame stats"
            );
        }
        Ok(culled)
    }

    pub fn expect_phase(&self, expected: FramePhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(HeliumError::FramePhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Splits the universe into the behavior pool and the mutable frame state
    /// handed to each cell update.
    pub(crate) fn frame_parts(&mut self) -> Result<(&BehaviorPool, FrameContext<'_>)> {
        self.expect_phase(FramePhase::SceneRender)?;
        Ok((
            &self.behaviors,
            FrameContext {
                dt: self.delta,
                input: &self.input,
                view: self.view,
                framebuffer: self.framebuffer,
                lights: &mut self.lights,
                particles: &mut self.particles,
                draws: &mut self.draws,
                rng: &mut self.rng,
            },
        ))
    }

    pub fn scroll_zoom(&mut self, dy: f32) {
        let camera = &self.config.camera;
        self.zoom = (self.zoom * (1.0 + dy * camera.scroll_step)).clamp(camera.min_zoom, camera.max_zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = self.config.camera.zoom;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn add_behavior(&mut self, behavior: impl Into<TileBehavior>) -> BehaviorId {
        self.behaviors.insert(behavior)
    }

    pub fn behaviors(&self) -> &BehaviorPool {
        &self.behaviors
    }

    pub fn add_body(&mut self, body: PhysicsBody) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn body(&self, index: usize) -> Option<&PhysicsBody> {
        self.bodies.get(index)
    }

    pub fn bodies(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn framebuffer(&self) -> Vec2 {
        self.framebuffer
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn atlas(&self) -> &TileAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut TileAtlas {
        &mut self.atlas
    }

    pub fn lights(&self) -> &LightAccumulator {
        &self.lights
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Size of the supersampled offscreen target for the current framebuffer.
    pub fn offscreen_size(&self) -> (u32, u32) {
        let factor = self.config.render.supersample.max(1);
        (
            self.framebuffer.x as u32 * factor,
            self.framebuffer.y as u32 * factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Universe {
        Universe::new(UniverseConfig {
            seed: Some(1),
            ..UniverseConfig::default()
        })
    }

    #[test]
    fn first_frame_has_zero_delta() {
        let mut universe = universe();
        universe.start_frame(12.5, (800, 600)).unwrap();
        assert_eq!(universe.delta(), 0.0);
        universe.post_frame().unwrap();
        universe.start_frame(12.75, (800, 600)).unwrap();
        assert!((universe.delta() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn phases_must_alternate() {
        let mut universe = universe();
        assert!(matches!(
            universe.post_frame(),
            Err(HeliumError::FramePhase { expected: FramePhase::SceneRender, actual: FramePhase::Idle })
        ));
        universe.start_frame(0.0, (100, 100)).unwrap();
        assert!(universe.start_frame(0.1, (100, 100)).is_err());
        universe.post_frame().unwrap();
        assert_eq!(universe.phase(), FramePhase::PostFrame);
        universe.start_frame(0.1, (100, 100)).unwrap();
    }

    #[test]
    fn zoom_is_clamped_and_resettable() {
        let mut universe = universe();
        for _ in 0..200 {
            universe.scroll_zoom(5.0);
        }
        assert_eq!(universe.zoom(), 0.5);
        for _ in 0..200 {
            universe.scroll_zoom(-5.0);
        }
        assert_eq!(universe.zoom(), 0.001);
        universe.reset_zoom();
        assert_eq!(universe.zoom(), 0.05);
    }

    #[test]
    fn free_bodies_are_integrated_at_frame_start() {
        let mut universe = universe();
        let id = universe.add_body(PhysicsBody::new(1.0).with_velocity(vec2(2.0, -1.0)));
        universe.start_frame(0.0, (64, 64)).unwrap();
        universe.post_frame().unwrap();
        universe.start_frame(0.5, (64, 64)).unwrap();
        let body = universe.body(id).unwrap();
        assert_eq!(body.position, vec2(1.0, -0.5));
    }

    #[test]
    fn offscreen_target_is_supersampled() {
        let mut universe = universe();
        universe.start_frame(0.0, (640, 480)).unwrap();
        assert_eq!(universe.offscreen_size(), (1280, 960));
        assert!((universe.aspect() - 640.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn fps_average_moves_towards_the_frame_rate() {
        let mut stats = FrameStats::default();
        for _ in 0..200 {
            stats.record(1.0 / 30.0);
        }
        assert!((stats.fps() - 30.0).abs() < 0.5);
        assert_eq!(stats.frames(), 200);
    }
}
