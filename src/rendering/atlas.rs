use glam::{vec4, Vec4};
use tracing::warn;

use crate::error::{HeliumError, Result};
use crate::format_loaders::tile_image::{TileImage, TILE_SIZE};

/// Slots per atlas row.
pub const ATLAS_COLUMNS: u32 = 16;
/// Total slots including the reserved null slot.
pub const ATLAS_CAPACITY: usize = (ATLAS_COLUMNS * ATLAS_COLUMNS) as usize;
/// Edge length of the atlas texture in pixels.
pub const ATLAS_SIZE: u32 = ATLAS_COLUMNS * TILE_SIZE;

/// Opaque reference to a tile image resident in the [`TileAtlas`].
/// The default value is the null reference, which always samples as fully
/// transparent.
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
pub struct TextureRef(u16);

impl TextureRef {
    pub const NULL: TextureRef = TextureRef(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn slot(self) -> u16 {
        self.0
    }
}

/// CPU staging copy of every tile image the game uses, packed into one square
/// texture. Slots are handed out once and stay resident for the atlas'
/// lifetime; there is no release path, so the GPU copy only ever grows.
pub struct TileAtlas {
    pixels: Vec<u8>,
    next_slot: usize,
    dirty: bool,
}

impl Default for TileAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl TileAtlas {
    pub fn new() -> Self {
        Self {
            pixels: vec![0u8; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize],
            next_slot: 1,
            dirty: true,
        }
    }

    pub fn register(&mut self, image: &TileImage) -> Result<TextureRef> {
        if self.next_slot >= ATLAS_CAPACITY {
            return Err(HeliumError::AtlasFull { capacity: ATLAS_CAPACITY - 1 });
        }
        let slot = self.next_slot;
        self.next_slot += 1;

        let rgba = image.to_rgba8();
        let (origin_x, origin_y) = slot_origin(slot as u16);
        let row_bytes = (TILE_SIZE * 4) as usize;
        for (row, texels) in rgba.chunks_exact(row_bytes).enumerate() {
            let offset = (((origin_y + row as u32) * ATLAS_SIZE + origin_x) * 4) as usize;
            self.pixels[offset..offset + row_bytes].copy_from_slice(texels);
        }
        self.dirty = true;

        if self.remaining() < ATLAS_COLUMNS as usize {
            warn!(remaining = self.remaining(), "tile atlas is almost full");
        }
        Ok(TextureRef(slot as u16))
    }

    pub fn decode_and_register(&mut self, bytes: &[u8]) -> Result<TextureRef> {
        let image = TileImage::decode(bytes)?;
        self.register(&image)
    }

    /// Number of registered images, not counting the null slot.
    pub fn len(&self) -> usize {
        self.next_slot - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        ATLAS_CAPACITY - self.next_slot
    }

    pub fn contains(&self, texture: TextureRef) -> bool {
        !texture.is_null() && (texture.0 as usize) < self.next_slot
    }

    /// Normalised `(u0, v0, u1, v1)` of the slot behind `texture`.
    pub fn uv_rect(&self, texture: TextureRef) -> Result<Vec4> {
        if !texture.is_null() && !self.contains(texture) {
            return Err(HeliumError::UnknownTexture(texture.0));
        }
        let (x, y) = slot_origin(texture.0);
        let size = ATLAS_SIZE as f32;
        Ok(vec4(
            x as f32 / size,
            y as f32 / size,
            (x + TILE_SIZE) as f32 / size,
            (y + TILE_SIZE) as f32 / size,
        ))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Hands out the pixels once after every change, for re-upload.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.pixels)
        } else {
            None
        }
    }
}

fn slot_origin(slot: u16) -> (u32, u32) {
    let slot = slot as u32;
    ((slot % ATLAS_COLUMNS) * TILE_SIZE, (slot / ATLAS_COLUMNS) * TILE_SIZE)
}

/// Packs per-cell references into RGBA8 texels (low byte, high byte) so a
/// shader can look the slot up by cell index.
pub fn encode_lookup(references: &[TextureRef], texels: &mut Vec<u8>) {
    texels.clear();
    texels.reserve(references.len() * 4);
    for reference in references {
        let [lo, hi] = reference.0.to_le_bytes();
        texels.extend_from_slice(&[lo, hi, 0, 255]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_slot_is_reserved() {
        let mut atlas = TileAtlas::new();
        let first = atlas.register(&TileImage::solid([255, 0, 0, 255])).unwrap();
        assert_eq!(first.slot(), 1);
        assert!(!first.is_null());
        assert!(TextureRef::default().is_null());
        assert!(!atlas.contains(TextureRef::NULL));
    }

    #[test]
    fn registered_pixels_land_in_their_slot() {
        let mut atlas = TileAtlas::new();
        let texture = atlas.register(&TileImage::solid([1, 2, 3, 4])).unwrap();
        let rect = atlas.uv_rect(texture).unwrap();
        let x = (rect.x * ATLAS_SIZE as f32) as usize;
        let y = (rect.y * ATLAS_SIZE as f32) as usize;
        let offset = (y * ATLAS_SIZE as usize + x) * 4;
        assert_eq!(&atlas.pixels()[offset..offset + 4], &[1, 2, 3, 4]);
        // the null slot stays transparent
        assert_eq!(&atlas.pixels()[..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn atlas_reports_when_full() {
        let mut atlas = TileAtlas::new();
        let image = TileImage::solid([9, 9, 9, 255]);
        for _ in 0..ATLAS_CAPACITY - 1 {
            atlas.register(&image).unwrap();
        }
        assert_eq!(atlas.remaining(), 0);
        assert!(matches!(atlas.register(&image), Err(HeliumError::AtlasFull { .. })));
    }

    #[test]
    fn dirty_flag_is_consumed_once() {
        let mut atlas = TileAtlas::new();
        assert!(atlas.take_dirty().is_some());
        assert!(atlas.take_dirty().is_none());
        atlas.register(&TileImage::solid([0, 0, 0, 255])).unwrap();
        assert!(atlas.take_dirty().is_some());
    }

    #[test]
    fn unknown_references_are_rejected() {
        let atlas = TileAtlas::new();
        assert!(matches!(atlas.uv_rect(TextureRef(5)), Err(HeliumError::UnknownTexture(5))));
    }

    #[test]
    fn lookup_encodes_slots_little_endian() {
        let mut texels = Vec::new();
        encode_lookup(&[TextureRef::NULL, TextureRef(3), TextureRef(258)], &mut texels);
        assert_eq!(texels, vec![0, 0, 0, 255, 3, 0, 0, 255, 2, 1, 0, 255]);
    }
}
