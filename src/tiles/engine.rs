use glam::{vec2, Vec3, Vec4};
use rand::Rng;

use crate::config::EngineConfig;
use crate::effects::{Light, Particle, ParticleState};
use crate::error::Result;
use crate::rendering::atlas::{TextureRef, TileAtlas};
use crate::rendering::transform::transform_point;
use crate::tiles::CellContext;
use crate::universe::FrameContext;

/// Thruster. Lit while any thrust control is held, dark otherwise; nothing is
/// latched between frames.
#[derive(Debug, Clone)]
pub struct Engine {
    off: TextureRef,
    on: TextureRef,
    config: EngineConfig,
}

impl Engine {
    pub fn new(off: TextureRef, on: TextureRef, config: &EngineConfig) -> Self {
        Self {
            off,
            on,
            config: config.clone(),
        }
    }

    pub fn load(atlas: &mut TileAtlas, off_bytes: &[u8], on_bytes: &[u8], config: &EngineConfig) -> Result<Self> {
        let off = atlas.decode_and_register(off_bytes)?;
        let on = atlas.decode_and_register(on_bytes)?;
        Ok(Self::new(off, on, config))
    }

    pub fn off_texture(&self) -> TextureRef {
        self.off
    }

    pub fn on_texture(&self) -> TextureRef {
        self.on
    }

    pub fn update_cell(&self, cell: &CellContext, frame: &mut FrameContext) -> TextureRef {
        if !frame.input.is_thrusting() {
            return self.off;
        }

        let transform = cell.cell_transform();
        frame.lights.push(Light::new(transform, Vec4::from(self.config.light_color)));

        let roll: f32 = frame.rng.gen();
        if roll <= frame.dt * self.config.exhaust_rate {
            let particle = self.exhaust_particle(cell, frame);
            frame.particles.add_first(particle);
        }

        self.on
    }

    fn exhaust_particle(&self, cell: &CellContext, frame: &mut FrameContext) -> Particle {
        let config = &self.config;
        let mix: f32 = frame.rng.gen();
        let rgb = Vec3::from(config.palette[0]) * mix + Vec3::from(config.palette[1]) * (1.0 - mix);
        let base_color = rgb.extend(sample(&mut *frame.rng, config.particle_alpha));
        let extent = sample(&mut *frame.rng, config.particle_size);
        let life = sample(&mut *frame.rng, config.particle_life);

        let velocity = -cell.ship_velocity * config.exhaust_velocity_factor;
        let position = transform_point(
            cell.cell_transform(),
            vec2(0.5 - extent / 2.0, 0.5 - extent / 2.0),
        );
        let sprite_size = config.sprite_size;

        Particle::new(
            ParticleState {
                position,
                color: base_color,
                size: sprite_size,
            },
            life,
        )
        .with_rule(move |state, dt, fraction| {
            state.position += velocity * dt;
            state.color = base_color * fraction;
            state.size = sprite_size * fraction;
        })
    }
}

fn sample(rng: &mut impl Rng, [low, high]: [f32; 2]) -> f32 {
    if low < high {
        rng.gen_range(low..high)
    } else {
        low
    }
}
