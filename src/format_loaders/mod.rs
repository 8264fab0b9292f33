pub mod tile_image;
