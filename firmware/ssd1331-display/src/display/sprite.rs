//! 1bpp vertical-page sprites
//!
//! Sprite data uses the SSD1306-style page layout:
//!
//! ```text
//!            col 0   col 1   ...  col w-1
//! page 0   [byte 0][byte 1] ... [byte w-1]      rows 0..7
//! page 1   [byte w][ ...  ] ... [byte 2w-1]     rows 8..15
//! ...
//! ```
//!
//! Bit 0 of each byte is the topmost row of its page. A set bit is drawn in
//! the foreground color; a clear bit is transparent.

use super::framebuffer::{Framebuffer, Rgb565};
use crate::error::SpriteError;
use crate::geometry::Rect;

/// Immutable 1bpp sprite asset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub width: u16,
    pub height: u16,
    pub data: &'static [u8],
}

impl Sprite {
    /// Create a sprite without validating the data length
    ///
    /// Intended for compiled-in constants; use [`Sprite::checked`] for data
    /// that did not come from the build.
    pub const fn new(width: u16, height: u16, data: &'static [u8]) -> Self {
        Self { width, height, data }
    }

    /// Create a sprite, rejecting data whose length does not match the geometry
    pub fn checked(width: u16, height: u16, data: &'static [u8]) -> Result<Self, SpriteError> {
        let sprite = Self::new(width, height, data);
        let expected = sprite.expected_len();
        if data.len() != expected {
            return Err(SpriteError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(sprite)
    }

    /// Number of 8-row pages, `ceil(height / 8)`
    pub const fn pages(&self) -> usize {
        (self.height as usize + 7) / 8
    }

    /// Bytes the geometry requires
    pub const fn expected_len(&self) -> usize {
        self.width as usize * self.pages()
    }

    /// Data length matches the geometry
    pub const fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Zero width or height
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bounding rectangle when drawn at `(x, y)`
    pub fn bounds_at(&self, x: i32, y: i32) -> Rect {
        Rect::new(x, y, self.width as i32, self.height as i32)
    }

    /// Whether the pixel at `(col, row)` is set
    pub fn pixel(&self, col: u16, row: u16) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        let idx = (row as usize / 8) * self.width as usize + col as usize;
        match self.data.get(idx) {
            Some(byte) => (byte >> (row % 8)) & 1 != 0,
            None => false,
        }
    }
}

impl Framebuffer {
    /// Blit a 1bpp sprite with transparency
    ///
    /// Every set bit is written as `fg` at `(dstx + col, dsty + row)` if that
    /// pixel is on the panel. Returns the number of pixels actually drawn;
    /// zero for a non-empty sprite means the data was blank or the sprite
    /// was entirely off-screen.
    pub fn blit_sprite(&mut self, sprite: &Sprite, dstx: i32, dsty: i32, fg: Rgb565) -> usize {
        let mut drawn = 0;
        let mut bytes = sprite.data.iter();

        for page in 0..sprite.pages() {
            let ybase = page as i32 * 8;
            for col in 0..sprite.width as i32 {
                let Some(&byte) = bytes.next() else {
                    return drawn;
                };
                let mut bits = byte;
                for bit in 0..8 {
                    let row = ybase + bit;
                    if row >= sprite.height as i32 {
                        break;
                    }
                    if bits & 0x01 != 0 {
                        // a pixel past i32::MAX is off-screen anyway
                        let target = dstx.checked_add(col).zip(dsty.checked_add(row));
                        if let Some((x, y)) = target {
                            if self.set_pixel(x, y, fg) {
                                drawn += 1;
                            }
                        }
                    }
                    bits >>= 1;
                }
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DOT: [u8; 1] = [0x01];
    static BLANK: [u8; 6] = [0x00; 6];
    static TALL: [u8; 4] = [0x00, 0x00, 0x01, 0x00];
    static SOLID: [u8; 4] = [0xFF; 4];
    static DIAG: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];

    #[test]
    fn test_single_bit_decode() {
        let mut fb = Framebuffer::new();
        let sprite = Sprite::new(1, 8, &DOT);
        assert_eq!(fb.blit_sprite(&sprite, 0, 0, Rgb565::WHITE), 1);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb565::WHITE));
        let lit = fb.as_slice().iter().filter(|&&p| p != 0).count();
        assert_eq!(lit, 1);
    }

    #[test]
    fn test_page_boundary() {
        // 2 columns, 9 rows: two pages, 4 bytes. Bit 0 of page 1, column 0 is row 8.
        let sprite = Sprite::new(2, 9, &TALL);
        assert_eq!(sprite.pages(), 2);
        assert_eq!(sprite.expected_len(), 4);
        assert!(sprite.pixel(0, 8));

        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 10, 20, Rgb565::RED), 1);
        assert_eq!(fb.get_pixel(10, 28), Some(Rgb565::RED));
    }

    #[test]
    fn test_rows_past_height_ignored() {
        // height 9: page 1 holds only row 8, the other 7 bits are padding
        let sprite = Sprite::new(2, 9, &SOLID);
        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 0, 0, Rgb565::WHITE), 2 * 9);
        assert_eq!(fb.get_pixel(0, 9), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_transparency() {
        let mut fb = Framebuffer::new();
        fb.clear(Rgb565::BLUE);
        let before = fb.clone();
        let sprite = Sprite::new(3, 16, &BLANK);
        assert_eq!(fb.blit_sprite(&sprite, 5, 5, Rgb565::WHITE), 0);
        assert_eq!(fb, before);
    }

    #[test]
    fn test_lsb_is_top_row() {
        let sprite = Sprite::new(8, 8, &DIAG);
        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 0, 0, Rgb565::GREEN), 8);
        for i in 0..8 {
            assert_eq!(fb.get_pixel(i, i), Some(Rgb565::GREEN));
        }
        assert_eq!(fb.get_pixel(1, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_partially_off_screen() {
        let sprite = Sprite::new(8, 8, &DIAG);
        let mut fb = Framebuffer::new();
        // diagonal pixels (i, i) at (-3 + i, -3 + i): only i >= 3 land on the panel
        assert_eq!(fb.blit_sprite(&sprite, -3, -3, Rgb565::WHITE), 5);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb565::WHITE));
        // right edge
        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 92, 0, Rgb565::WHITE), 4);
    }

    #[test]
    fn test_fully_off_screen_draws_nothing() {
        let sprite = Sprite::new(8, 8, &DIAG);
        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 96, 0, Rgb565::WHITE), 0);
        assert_eq!(fb.blit_sprite(&sprite, -8, 0, Rgb565::WHITE), 0);
    }

    #[test]
    fn test_extreme_destination_draws_nothing() {
        let mut fb = Framebuffer::new();
        let solid = Sprite::new(4, 8, &SOLID);
        assert_eq!(fb.blit_sprite(&solid, i32::MAX - 2, 0, Rgb565::WHITE), 0);
        assert_eq!(fb.blit_sprite(&solid, 0, i32::MAX - 2, Rgb565::WHITE), 0);
        assert_eq!(fb.blit_sprite(&solid, i32::MIN, i32::MIN, Rgb565::WHITE), 0);
        assert_eq!(fb.diff_count(Framebuffer::new().as_slice()), 0);
    }

    #[test]
    fn test_short_data_stops_without_panic() {
        let sprite = Sprite::new(4, 16, &DIAG[..3]);
        assert!(!sprite.is_well_formed());
        let mut fb = Framebuffer::new();
        assert_eq!(fb.blit_sprite(&sprite, 0, 0, Rgb565::WHITE), 3);
    }

    #[test]
    fn test_checked_rejects_bad_length() {
        assert_eq!(
            Sprite::checked(4, 9, &SOLID),
            Err(SpriteError::LengthMismatch { expected: 8, actual: 4 })
        );
        assert!(Sprite::checked(2, 9, &SOLID).is_ok());
    }
}
