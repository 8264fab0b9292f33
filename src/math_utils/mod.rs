use std::f32::consts::{PI, TAU};

use glam::{vec2, Mat4, Vec2, Vec4};

/// Wraps an angle in radians into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Hard-clips `angle` into `[-half_arc, half_arc]`.
/// The flag tells whether the angle already was inside the arc.
pub fn clamp_to_arc(angle: f32, half_arc: f32) -> (f32, bool) {
    if angle > half_arc {
        (half_arc, false)
    } else if angle < -half_arc {
        (-half_arc, false)
    } else {
        (angle, true)
    }
}

/// Projects the local origin of `model` through `view` and returns its position
/// in framebuffer pixels with the origin at the bottom-left corner.
pub fn project_origin_to_pixels(view: Mat4, model: Mat4, framebuffer: Vec2) -> Vec2 {
    let clip = view * model * Vec4::new(0.0, 0.0, 0.0, 1.0);
    vec2(
        (clip.x / 2.0 + 0.5) * framebuffer.x,
        (clip.y / 2.0 + 0.5) * framebuffer.y,
    )
}

/// Screen-space heading from `pivot` (bottom-left origin) to `cursor`
/// (top-left origin, as reported by the window), zero pointing straight up and
/// growing counter-clockwise.
pub fn heading_to_cursor(pivot: Vec2, cursor: Vec2, framebuffer_height: f32) -> f32 {
    let dx = cursor.x - pivot.x;
    let dy = (framebuffer_height - cursor.y) - pivot.y;
    (-dx).atan2(dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn normalization_wraps_into_half_open_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < EPS);
        assert!((normalize_angle(-PI) - PI).abs() < EPS);
        assert!((normalize_angle(TAU + 0.5) - 0.5).abs() < EPS);
        assert!((normalize_angle(-0.25) + 0.25).abs() < EPS);
    }

    #[test]
    fn arc_clamp_reports_clipping() {
        let half = 70f32.to_radians();
        assert_eq!(clamp_to_arc(0.3, half), (0.3, true));
        assert_eq!(clamp_to_arc(2.0, half), (half, false));
        assert_eq!(clamp_to_arc(-2.0, half), (-half, false));
    }

    #[test]
    fn cursor_heading_matches_screen_directions() {
        let pivot = vec2(50.0, 50.0);
        // cursor above the pivot (window y grows downwards)
        assert!(heading_to_cursor(pivot, vec2(50.0, 10.0), 100.0).abs() < EPS);
        // cursor to the left is a positive (counter-clockwise) turn
        let left = heading_to_cursor(pivot, vec2(10.0, 50.0), 100.0);
        assert!((left - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn projection_of_identity_lands_in_the_middle() {
        let px = project_origin_to_pixels(Mat4::IDENTITY, Mat4::IDENTITY, vec2(800.0, 600.0));
        assert_eq!(px, vec2(400.0, 300.0));
    }
}
