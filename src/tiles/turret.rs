use glam::{vec2, vec3, Mat4, Vec2, Vec4};

use crate::config::TurretConfig;
use crate::effects::Light;
use crate::error::Result;
use crate::input::Control;
use crate::math_utils::{clamp_to_arc, heading_to_cursor, normalize_angle, project_origin_to_pixels};
use crate::rendering::atlas::{TextureRef, TileAtlas};
use crate::rendering::transform::translated;
use crate::tiles::CellContext;
use crate::universe::{DrawCommand, FrameContext};

/// Gun pivot inside the cell: horizontally centred, one texel below the base.
const PIVOT_OFFSET: Vec2 = glam::const_vec2!([0.5, -1.0 / 16.0]);
/// Muzzle flash position relative to the gun quad.
const MUZZLE_OFFSET: Vec2 = glam::const_vec2!([0.0, 1.0 / 16.0]);

/// Result of aiming for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TurretAim {
    /// Gun angle relative to the ship, radians, inside the firing arc.
    pub angle: f32,
    /// Whether the cursor itself was inside the arc.
    pub can_fire: bool,
}

/// Mouse-aimed gun on a fixed mount. The aim is recomputed from the cursor
/// every frame and hard-clipped to the arc, so the gun snaps to the arc edge
/// instead of slewing towards it.
#[derive(Debug, Clone)]
pub struct Turret {
    mount: TextureRef,
    gun: TextureRef,
    half_arc: f32,
    muzzle_color: Vec4,
}

impl Turret {
    pub fn new(mount: TextureRef, gun: TextureRef, config: &TurretConfig) -> Self {
        Self {
            mount,
            gun,
            half_arc: config.arc_degrees.to_radians(),
            muzzle_color: Vec4::from(config.muzzle_light_color),
        }
    }

    pub fn load(atlas: &mut TileAtlas, mount_bytes: &[u8], gun_bytes: &[u8], config: &TurretConfig) -> Result<Self> {
        let mount = atlas.decode_and_register(mount_bytes)?;
        let gun = atlas.decode_and_register(gun_bytes)?;
        Ok(Self::new(mount, gun, config))
    }

    pub fn mount_texture(&self) -> TextureRef {
        self.mount
    }

    pub fn gun_texture(&self) -> TextureRef {
        self.gun
    }

    pub fn half_arc(&self) -> f32 {
        self.half_arc
    }

    /// Aims from `pivot` (framebuffer pixels, bottom-left origin) at `cursor`
    /// (window pixels, top-left origin) for a ship facing `heading`.
    pub fn aim(&self, pivot: Vec2, cursor: Vec2, framebuffer_height: f32, heading: f32) -> TurretAim {
        let local = normalize_angle(heading_to_cursor(pivot, cursor, framebuffer_height) - heading);
        let (angle, can_fire) = clamp_to_arc(local, self.half_arc);
        TurretAim { angle, can_fire }
    }

    pub fn update_cell(&self, cell: &CellContext, frame: &mut FrameContext) -> TextureRef {
        let pivot = translated(
            cell.transform,
            vec2(cell.x as f32, cell.y as f32) + PIVOT_OFFSET,
        );
        let pivot_px = project_origin_to_pixels(frame.view, pivot, frame.framebuffer);
        let aim = self.aim(pivot_px, frame.input.cursor(), frame.framebuffer.y, cell.heading);

        let gun = pivot * Mat4::from_rotation_z(aim.angle) * Mat4::from_translation(vec3(-0.5, 0.0, 0.0));
        frame.draws.push(DrawCommand::Sprite {
            transform: frame.view * gun,
            texture: self.gun,
        });

        if aim.can_fire && frame.input.is_active(Control::Fire) {
            frame.lights.push(Light::new(translated(gun, MUZZLE_OFFSET), self.muzzle_color));
        }

        self.mount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn turret() -> Turret {
        Turret::new(TextureRef::NULL, TextureRef::NULL, &TurretConfig::default())
    }

    #[test]
    fn aim_stays_inside_the_arc_for_every_cursor() {
        let turret = turret();
        let limit = 70f32.to_radians() + 1e-6;
        let pivot = vec2(400.0, 300.0);
        for step in 0..360 {
            let theta = (step as f32).to_radians();
            let cursor = vec2(400.0 + 200.0 * theta.cos(), 300.0 + 200.0 * theta.sin());
            for heading in [0.0, 1.0, -2.5, 6.0] {
                let aim = turret.aim(pivot, cursor, 600.0, heading);
                assert!(aim.angle.abs() <= limit, "angle {} out of arc", aim.angle);
            }
        }
    }

    #[test]
    fn cursor_behind_the_turret_is_clipped_and_blocks_fire() {
        let turret = turret();
        // pivot in the middle of a 600px high framebuffer, cursor straight below
        let aim = turret.aim(vec2(400.0, 300.0), vec2(400.0, 550.0), 600.0, 0.0);
        assert!((aim.angle.abs() - 70f32.to_radians()).abs() < 1e-5);
        assert!(!aim.can_fire);
    }

    #[test]
    fn cursor_ahead_allows_fire() {
        let turret = turret();
        let aim = turret.aim(vec2(400.0, 300.0), vec2(420.0, 100.0), 600.0, 0.0);
        assert!(aim.can_fire);
        assert!(aim.angle < 0.0);
    }

    #[test]
    fn heading_is_subtracted_and_wrapped() {
        let turret = turret();
        // ship rotated almost a full turn, cursor straight ahead on screen
        let aim = turret.aim(vec2(0.0, 0.0), vec2(0.0, -100.0), 0.0, 2.0 * PI - 0.1);
        assert!(aim.can_fire);
        assert!((aim.angle - 0.1).abs() < 1e-4);
    }

    #[test]
    fn can_fire_tracks_the_unclamped_magnitude() {
        let turret = turret();
        let pivot = vec2(0.0, 0.0);
        for degrees in [60.0f32, 69.0, 71.0, 90.0, 179.0] {
            let theta = degrees.to_radians();
            // screen heading theta: cursor at (-sin, cos) in bottom-left space
            let cursor = vec2(-theta.sin() * 100.0, -theta.cos() * 100.0);
            let aim = turret.aim(pivot, cursor, 0.0, 0.0);
            assert_eq!(aim.can_fire, degrees <= 70.0, "at {} degrees", degrees);
        }
    }
}
