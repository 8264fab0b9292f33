use crate::error::Result;
use crate::rendering::atlas::{TextureRef, TileAtlas};
use crate::tiles::CellContext;
use crate::universe::FrameContext;

/// Structural hull plate. Always shows the same texture, never emits anything.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Plating {
    texture: TextureRef,
}

impl Plating {
    pub fn new(texture: TextureRef) -> Self {
        Self { texture }
    }

    pub fn load(atlas: &mut TileAtlas, image_bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(atlas.decode_and_register(image_bytes)?))
    }

    pub fn texture(&self) -> TextureRef {
        self.texture
    }

    pub fn update_cell(&self, _cell: &CellContext, _frame: &mut FrameContext) -> TextureRef {
        self.texture
    }
}
