pub mod atlas;
pub mod compositor;
pub mod shaders;
pub mod transform;
