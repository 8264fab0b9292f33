pub mod light;
pub mod particles;

pub use light::{Light, LightAccumulator};
pub use particles::{Particle, ParticleId, ParticleState, ParticleSystem};
