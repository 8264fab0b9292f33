use thiserror::Error;

use crate::universe::FramePhase;

pub type Result<T> = std::result::Result<T, HeliumError>;

#[derive(Error, Debug)]
pub enum HeliumError {
    #[error("Tile texture must be {expected}x{expected}, got {width}x{height}")]
    TextureDimensions { expected: u32, width: u32, height: u32 },
    #[error("Unsupported channel count {0}, expected 1, 3 or 4")]
    UnsupportedChannels(u8),
    #[error("Failed to decode image")]
    Decode(#[from] image::ImageError),
    #[error("Pixel data has {actual} bytes, expected {expected}")]
    PixelDataLength { expected: usize, actual: usize },
    #[error("Texture atlas is full ({capacity} slots)")]
    AtlasFull { capacity: usize },
    #[error("Unknown texture reference {0}")]
    UnknownTexture(u16),
    #[error("Cell ({x}, {y}) is outside of a {width}x{height} grid")]
    CellOutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("Unknown tile behavior {0}")]
    UnknownBehavior(u32),
    #[error("Offscreen render target {width}x{height} is incomplete")]
    IncompleteRenderTarget { width: u32, height: u32 },
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("Frame phase violation: expected {expected:?}, found {actual:?}")]
    FramePhase { expected: FramePhase, actual: FramePhase },
    #[error("Failed to parse config")]
    Config(#[from] toml::de::Error),
    #[error("IO error")]
    Io(#[from] std::io::Error),
}
