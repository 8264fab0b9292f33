use helium::format_loaders::tile_image::{TileImage, TILE_SIZE};
use helium::Result;

fn paint(pixel: impl Fn(u32, u32) -> [u8; 4]) -> Result<TileImage> {
    let mut pixels = Vec::with_capacity((TILE_SIZE * TILE_SIZE * 4) as usize);
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            pixels.extend_from_slice(&pixel(x, y));
        }
    }
    TileImage::from_raw(TILE_SIZE, TILE_SIZE, 4, pixels)
}

fn is_border(x: u32, y: u32) -> bool {
    x == 0 || y == 0 || x == TILE_SIZE - 1 || y == TILE_SIZE - 1
}

pub fn hull() -> Result<TileImage> {
    paint(|x, y| {
        if is_border(x, y) {
            [70, 74, 82, 255]
        } else if (x + y) % 7 == 0 {
            [120, 126, 138, 255]
        } else {
            [98, 104, 116, 255]
        }
    })
}

pub fn engine(lit: bool) -> Result<TileImage> {
    paint(|x, y| {
        let nozzle = (4..12).contains(&x) && y >= 10;
        match (nozzle, lit) {
            (true, true) => [255, 214, 96, 255],
            (true, false) => [40, 40, 44, 255],
            _ if is_border(x, y) => [70, 74, 82, 255],
            _ => [88, 92, 102, 255],
        }
    })
}

pub fn turret_mount() -> Result<TileImage> {
    paint(|x, y| {
        let dx = x as i32 - 8;
        let dy = y as i32 - 8;
        if dx * dx + dy * dy <= 25 {
            [60, 62, 70, 255]
        } else if is_border(x, y) {
            [70, 74, 82, 255]
        } else {
            [98, 104, 116, 255]
        }
    })
}

pub fn turret_gun() -> Result<TileImage> {
    paint(|x, _y| {
        if (7..9).contains(&x) {
            [180, 184, 196, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}
