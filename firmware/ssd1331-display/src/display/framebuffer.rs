//! RGB565 Framebuffer with Bounds-Checked Operations
//!
//! Provides the software framebuffer for the 96×64 panel. All drawing
//! happens here; the panel only ever receives copies of framebuffer rows.

use super::ssd1331::{HEIGHT, WIDTH};
use crate::geometry::{Rect, Window};

/// Pixels in one frame
pub const PIXELS: usize = (WIDTH as usize) * (HEIGHT as usize);

/// RGB565 color (16-bit: 5 red, 6 green, 5 blue)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);
    pub const RED: Self = Self(0xF800);
    pub const GREEN: Self = Self(0x07E0);
    pub const BLUE: Self = Self(0x001F);

    /// Create RGB565 from RGB888 components
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(rgb565(r, g, b))
    }

    /// Red channel, 5 bits
    pub const fn r5(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    /// Green channel, 6 bits
    pub const fn g6(self) -> u8 {
        ((self.0 >> 5) & 0x3F) as u8
    }

    /// Blue channel, 5 bits
    pub const fn b5(self) -> u8 {
        (self.0 & 0x1F) as u8
    }

    /// Expand back to RGB888 (low bits replicated from the high bits)
    pub const fn to_rgb888(self) -> (u8, u8, u8) {
        let r = self.r5();
        let g = self.g6();
        let b = self.b5();
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }

    /// Wire order: high byte first
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<u16> for Rgb565 {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Rgb565> for u16 {
    fn from(c: Rgb565) -> Self {
        c.0
    }
}

/// Pack 8-bit channels into RGB565 (R:G:B from high to low bits)
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16 & 0x1F;
    let g6 = (g >> 2) as u16 & 0x3F;
    let b5 = (b >> 3) as u16 & 0x1F;
    (r5 << 11) | (g6 << 5) | b5
}

/// Framebuffer for the 96×64 RGB565 panel
#[derive(Clone)]
pub struct Framebuffer {
    buffer: [u16; PIXELS],
}

impl Framebuffer {
    /// Create a new framebuffer initialized to black
    pub const fn new() -> Self {
        Self { buffer: [0; PIXELS] }
    }

    /// Framebuffer width in pixels
    pub const fn width(&self) -> u8 {
        WIDTH
    }

    /// Framebuffer height in pixels
    pub const fn height(&self) -> u8 {
        HEIGHT
    }

    #[inline]
    fn index(x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
            return None;
        }
        Some(y as usize * WIDTH as usize + x as usize)
    }

    /// Get pixel at coordinates
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        Self::index(x, y).map(|idx| Rgb565(self.buffer[idx]))
    }

    /// Set pixel at coordinates (bounds-checked)
    ///
    /// Returns false, and leaves the buffer untouched, when `(x, y)` is off
    /// the panel.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.buffer[idx] = color.0;
                true
            }
            None => false,
        }
    }

    /// Clear framebuffer to a solid color
    pub fn clear(&mut self, color: Rgb565) {
        self.buffer.fill(color.0);
    }

    /// Fill a rectangle, clipped to the panel
    ///
    /// Empty and fully off-screen rectangles are a no-op. Returns the number
    /// of pixels written.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> usize {
        match Rect::new(x, y, w, h).clip(WIDTH, HEIGHT) {
            Some(window) => self.fill_window(&window, color),
            None => 0,
        }
    }

    fn fill_window(&mut self, window: &Window, color: Rgb565) -> usize {
        let x0 = window.x0 as usize;
        let x1 = window.x1 as usize;
        for y in window.y0..=window.y1 {
            let start = y as usize * WIDTH as usize;
            self.buffer[start + x0..=start + x1].fill(color.0);
        }
        window.pixel_count()
    }

    /// One row of pixels
    ///
    /// # Panics
    /// If `y >= HEIGHT`.
    pub fn row(&self, y: u8) -> &[u16] {
        let start = y as usize * WIDTH as usize;
        &self.buffer[start..start + WIDTH as usize]
    }

    /// Pixels of `window` within row `y`
    pub(crate) fn window_row(&self, window: &Window, y: u8) -> &[u16] {
        &self.row(y)[window.x0 as usize..=window.x1 as usize]
    }

    /// Get raw buffer, row-major
    pub fn as_slice(&self) -> &[u16] {
        &self.buffer
    }

    /// Count pixels differing from `other`
    pub fn diff_count(&self, other: &[u16]) -> usize {
        self.buffer
            .iter()
            .zip(other.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl PartialEq for Framebuffer {
    fn eq(&self, other: &Self) -> bool {
        self.buffer[..] == other.buffer[..]
    }
}

impl Eq for Framebuffer {}

impl core::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Framebuffer({}x{})", WIDTH, HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_extremes() {
        assert_eq!(rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb565(0, 0, 0), 0x0000);
        assert_eq!(Rgb565::from_rgb(255, 0, 0), Rgb565::RED);
        assert_eq!(Rgb565::from_rgb(0, 255, 0), Rgb565::GREEN);
        assert_eq!(Rgb565::from_rgb(0, 0, 255), Rgb565::BLUE);
    }

    #[test]
    fn test_rgb565_packing_order() {
        let c = Rgb565::from_rgb(0x08, 0x04, 0x08);
        assert_eq!(c.0, (1 << 11) | (1 << 5) | 1);
        assert_eq!(c.to_be_bytes(), [0x08, 0x21]);
        assert_eq!(Rgb565::WHITE.to_rgb888(), (255, 255, 255));
    }

    #[test]
    fn test_set_get_pixel_bounds() {
        let mut fb = Framebuffer::new();
        assert!(fb.set_pixel(95, 63, Rgb565::WHITE));
        assert!(!fb.set_pixel(96, 0, Rgb565::WHITE));
        assert!(!fb.set_pixel(-1, 0, Rgb565::WHITE));
        assert_eq!(fb.get_pixel(95, 63), Some(Rgb565::WHITE));
        assert_eq!(fb.get_pixel(0, 64), None);
    }

    #[test]
    fn test_clear_fills_everything() {
        let mut fb = Framebuffer::new();
        fb.clear(Rgb565::BLUE);
        assert!(fb.as_slice().iter().all(|&p| p == Rgb565::BLUE.0));
    }

    #[test]
    fn test_fill_rect_clipping_matches_explicit_rect() {
        let c = Rgb565::GREEN;
        let mut clipped = Framebuffer::new();
        let mut explicit = Framebuffer::new();
        assert_eq!(clipped.fill_rect(-5, -5, 20, 20, c), 225);
        explicit.fill_rect(0, 0, 15, 15, c);
        assert_eq!(clipped, explicit);
        assert_eq!(clipped.get_pixel(14, 14), Some(c));
        assert_eq!(clipped.get_pixel(15, 14), Some(Rgb565::BLACK));
        assert_eq!(clipped.get_pixel(14, 15), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_fill_rect_noops() {
        let mut fb = Framebuffer::new();
        assert_eq!(fb.fill_rect(10, 10, 0, 5, Rgb565::RED), 0);
        assert_eq!(fb.fill_rect(10, 10, 5, -3, Rgb565::RED), 0);
        assert_eq!(fb.fill_rect(200, 10, 5, 5, Rgb565::RED), 0);
        assert_eq!(fb.fill_rect(-20, -20, 5, 5, Rgb565::RED), 0);
        assert_eq!(fb, Framebuffer::new());
    }
}
