use image::GenericImageView;

use crate::error::{HeliumError, Result};

/// Edge length in pixels of every tile texture.
pub const TILE_SIZE: u32 = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(PixelFormat::Red),
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            other => Err(HeliumError::UnsupportedChannels(other)),
        }
    }

    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// A validated `TILE_SIZE` x `TILE_SIZE` image in its source channel layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl TileImage {
    /// Decodes an encoded image (PNG and friends) and checks it against the
    /// tile ingestion contract.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        check_dimensions(width, height)?;
        let format = PixelFormat::from_channels(img.color().channel_count())?;
        let pixels = match format {
            PixelFormat::Red => img.to_luma8().into_raw(),
            PixelFormat::Rgb => img.to_rgb8().into_raw(),
            PixelFormat::Rgba => img.to_rgba8().into_raw(),
        };
        Ok(Self { format, pixels })
    }

    pub fn from_raw(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let format = PixelFormat::from_channels(channels)?;
        let expected = (width * height) as usize * format.channels();
        if pixels.len() != expected {
            return Err(HeliumError::PixelDataLength { expected, actual: pixels.len() });
        }
        Ok(Self { format, pixels })
    }

    pub fn solid(color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((TILE_SIZE * TILE_SIZE * 4) as usize)
            .collect();
        Self { format: PixelFormat::Rgba, pixels }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Expands to RGBA8 the way a GL upload into an RGBA8 texture would:
    /// missing colour channels become zero, missing alpha becomes opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let channels = self.format.channels();
        let mut rgba = Vec::with_capacity((TILE_SIZE * TILE_SIZE * 4) as usize);
        for texel in self.pixels.chunks_exact(channels) {
            match self.format {
                PixelFormat::Red => rgba.extend_from_slice(&[texel[0], 0, 0, 255]),
                PixelFormat::Rgb => rgba.extend_from_slice(&[texel[0], texel[1], texel[2], 255]),
                PixelFormat::Rgba => rgba.extend_from_slice(texel),
            }
        }
        rgba
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width != TILE_SIZE || height != TILE_SIZE {
        return Err(HeliumError::TextureDimensions { expected: TILE_SIZE, width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use image::{DynamicImage, ImageOutputFormat};

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn decodes_rgba_png() {
        let png = encode_png(DynamicImage::new_rgba8(16, 16));
        let tile = TileImage::decode(&png).unwrap();
        assert_eq!(tile.format(), PixelFormat::Rgba);
        assert_eq!(tile.pixels().len(), 16 * 16 * 4);
    }

    #[test]
    fn channel_count_selects_format() {
        let gray = TileImage::decode(&encode_png(DynamicImage::new_luma8(16, 16))).unwrap();
        assert_eq!(gray.format(), PixelFormat::Red);
        let rgb = TileImage::decode(&encode_png(DynamicImage::new_rgb8(16, 16))).unwrap();
        assert_eq!(rgb.format(), PixelFormat::Rgb);
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let png = encode_png(DynamicImage::new_rgba8(32, 16));
        match TileImage::decode(&png) {
            Err(HeliumError::TextureDimensions { width: 32, height: 16, .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn two_channel_images_are_rejected() {
        let png = encode_png(DynamicImage::new_luma_a8(16, 16));
        assert!(matches!(TileImage::decode(&png), Err(HeliumError::UnsupportedChannels(2))));
    }

    #[test]
    fn raw_red_expands_to_opaque_rgba() {
        let tile = TileImage::from_raw(16, 16, 1, vec![200; 256]).unwrap();
        let rgba = tile.to_rgba8();
        assert_eq!(rgba.len(), 1024);
        assert_eq!(&rgba[..4], &[200, 0, 0, 255]);
    }

    #[test]
    fn raw_length_is_checked() {
        assert!(matches!(
            TileImage::from_raw(16, 16, 3, vec![0; 10]),
            Err(HeliumError::PixelDataLength { expected: 768, actual: 10 })
        ));
    }
}
