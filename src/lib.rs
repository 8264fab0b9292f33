//! A starship assembled from a grid of pluggable tiles, flown with simple Newtonian
//! kinematics and drawn through a supersampled offscreen target that is composited
//! with additive particles and lights.
//!
//! The crate is split in two halves. The CPU half ([`universe::Universe`],
//! [`ship::TileGrid`], [`tiles`], [`effects`]) advances the simulation and records
//! what should be drawn; the GPU half ([`rendering::compositor::Compositor`],
//! driven by [`window::Stage`]) replays those records through miniquad.

pub mod config;
pub mod effects;
pub mod error;
pub mod format_loaders;
pub mod input;
pub mod math_utils;
pub mod physics;
pub mod rendering;
pub mod ship;
pub mod tiles;
pub mod universe;
pub mod utility;
pub mod window;

pub use error::{HeliumError, Result};
