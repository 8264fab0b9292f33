use glam::{vec3, Mat4, Vec2, Vec4};

/// Translate, then rotate about the translated point, then shift by `origin`.
/// This is the shape of every placement in the game: the ship body, a cell
/// inside the ship, a turret gun around its pivot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    translation: Vec2,
    rotation: f32,
    origin: Vec2,
    pub(crate) matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_identity()
    }
}

impl Transform {
    pub fn from_identity() -> Transform {
        Self {
            translation: Vec2::ZERO,
            rotation: 0.0,
            origin: Vec2::ZERO,
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn from_translation(translation: Vec2) -> Self {
        Self::from_identity().with_translation(translation)
    }

    pub fn from_angle_and_translation(angle: f32, translation: Vec2) -> Self {
        Self::from_translation(translation).with_rotation(angle)
    }

    pub fn with_rotation(self, rotation: f32) -> Self {
        Self { rotation, ..self }.actualized()
    }

    pub fn with_translation(self, translation: Vec2) -> Self {
        Self { translation, ..self }.actualized()
    }

    /// Offset applied after rotation, e.g. `-extent / 2` to spin around a centre.
    pub fn with_origin(self, origin: Vec2) -> Self {
        Self { origin, ..self }.actualized()
    }

    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    fn actualized(mut self) -> Self {
        self.matrix = Mat4::from_translation(self.translation.extend(0.0))
            * Mat4::from_rotation_z(self.rotation)
            * Mat4::from_translation(self.origin.extend(0.0));
        self
    }
}

/// Pixel-aspect correction combined with zoom. The longer screen side spans
/// `2 / zoom` world units.
pub fn view_scale(aspect: f32, zoom: f32) -> Mat4 {
    if aspect > 1.0 {
        Mat4::from_scale(vec3(zoom, aspect * zoom, zoom))
    } else {
        Mat4::from_scale(vec3(zoom / aspect, zoom, zoom))
    }
}

/// Local point `local` pushed through `matrix`.
pub fn transform_point(matrix: Mat4, local: Vec2) -> Vec2 {
    let p = matrix * Vec4::new(local.x, local.y, 0.0, 1.0);
    Vec2::new(p.x, p.y)
}

/// Child placement relative to a parent matrix: translate by `offset`.
pub fn translated(parent: Mat4, offset: Vec2) -> Mat4 {
    parent * Mat4::from_translation(offset.extend(0.0))
}
