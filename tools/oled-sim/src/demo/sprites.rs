//! Demo sprite assets
//!
//! 1bpp vertical-page bitmaps: one byte per column per 8-row page, bit 0 on
//! top.

use ssd1331_display::Sprite;

static DINO_RIGHT_DATA: [u8; 24] = [
    0xC0, 0x00, 0x00, 0x80, 0xC0, 0xFE, 0xFF, 0xFD, 0xFF, 0x2F, 0x2F, 0x0F,
    0x01, 0x03, 0x07, 0xFF, 0x9F, 0x0F, 0x1F, 0xFF, 0x87, 0x03, 0x00, 0x00,
];
pub static DINO_RIGHT: Sprite = Sprite::new(12, 16, &DINO_RIGHT_DATA);

static DINO_LEFT_DATA: [u8; 24] = [
    0x0F, 0x2F, 0x2F, 0xFF, 0xFD, 0xFF, 0xFE, 0xC0, 0x80, 0x00, 0x00, 0xC0,
    0x00, 0x00, 0x03, 0x87, 0xFF, 0x1F, 0x0F, 0x9F, 0xFF, 0x07, 0x03, 0x01,
];
pub static DINO_LEFT: Sprite = Sprite::new(12, 16, &DINO_LEFT_DATA);

static DINO_DEAD_DATA: [u8; 24] = [
    0xC0, 0x00, 0x00, 0x80, 0xC0, 0xFE, 0xF5, 0xFB, 0xF5, 0x5F, 0x1F, 0x1F,
    0x01, 0x03, 0x07, 0xFF, 0x9F, 0x0F, 0x1F, 0xFF, 0x87, 0x03, 0x00, 0x00,
];
pub static DINO_DEAD: Sprite = Sprite::new(12, 16, &DINO_DEAD_DATA);

static CACTUS_DATA: [u8; 16] = [
    0xF0, 0x00, 0xFE, 0xFF, 0xFF, 0xFE, 0x80, 0xF8,
    0x03, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00,
];
pub static CACTUS: Sprite = Sprite::new(8, 16, &CACTUS_DATA);

static BIRD_UP_DATA: [u8; 12] = [
    0x10, 0x18, 0x18, 0x1F, 0x3E, 0x7C, 0x78, 0x78, 0x70, 0x60, 0x40, 0x40,
];
pub static BIRD_UP: Sprite = Sprite::new(12, 8, &BIRD_UP_DATA);

static BIRD_DOWN_DATA: [u8; 12] = [
    0x04, 0x0E, 0x0C, 0xEC, 0x7C, 0x3C, 0x1C, 0x3C, 0x34, 0x30, 0x20, 0x20,
];
pub static BIRD_DOWN: Sprite = Sprite::new(12, 8, &BIRD_DOWN_DATA);

static BANNER_DATA: [u8; 76] = [0xFF; 76];
/// Game-over bar
pub static BANNER: Sprite = Sprite::new(76, 8, &BANNER_DATA);
