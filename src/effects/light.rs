use glam::{Mat4, Vec2, Vec4};

use crate::rendering::transform::transform_point;

/// A glow drawn additively on top of the resolved frame. Covers the unit
/// square of its transform. Lights only live for the frame that emitted them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub transform: Mat4,
    pub color: Vec4,
}

impl Light {
    pub fn new(transform: Mat4, color: Vec4) -> Self {
        Self { transform, color }
    }

    /// World position of the light's centre.
    pub fn center(&self) -> Vec2 {
        transform_point(self.transform, Vec2::splat(0.5))
    }
}

#[derive(Debug, Default, Clone)]
pub struct LightAccumulator {
    lights: Vec<Light>,
}

impl LightAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Light> {
        self.lights.iter()
    }

    pub fn as_slice(&self) -> &[Light] {
        &self.lights
    }
}

impl<'a> IntoIterator for &'a LightAccumulator {
    type Item = &'a Light;
    type IntoIter = std::slice::Iter<'a, Light>;

    fn into_iter(self) -> Self::IntoIter {
        self.lights.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{vec2, vec3};

    #[test]
    fn accumulator_clears_between_frames() {
        let mut lights = LightAccumulator::new();
        lights.push(Light::new(Mat4::IDENTITY, Vec4::ONE));
        lights.push(Light::new(Mat4::IDENTITY, Vec4::ONE));
        assert_eq!(lights.len(), 2);
        lights.clear();
        assert!(lights.is_empty());
    }

    #[test]
    fn center_follows_transform() {
        let light = Light::new(Mat4::from_translation(vec3(3.0, 4.0, 0.0)), Vec4::ONE);
        assert_eq!(light.center(), vec2(3.5, 4.5));
    }
}
