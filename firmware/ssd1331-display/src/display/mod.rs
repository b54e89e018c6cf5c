//! Display driver and graphics primitives
//!
//! Provides the SSD1331 driver, an RGB565 framebuffer with bounds-checked
//! drawing, the 1bpp sprite blitter, and dirty-rectangle sync.

pub mod framebuffer;
pub mod ssd1331;
pub mod sprite;
pub mod sync;

pub use framebuffer::{rgb565, Framebuffer, Rgb565};
pub use ssd1331::{Ssd1331, HEIGHT, WIDTH};
pub use sprite::Sprite;
pub use sync::FlushStats;

use crate::error::{DisplayError, DisplayResult};
use crate::geometry::{Rect, Window};
use crate::hal::Transport;

/// High-level display interface
///
/// Owns the framebuffer and the panel driver. Drawing calls only touch the
/// framebuffer; nothing reaches the panel until a flush.
pub struct Display<T: Transport> {
    controller: Ssd1331<T>,
    framebuffer: Framebuffer,
}

impl<T: Transport> Display<T> {
    /// Display width in pixels
    pub const WIDTH: u8 = WIDTH;
    /// Display height in pixels
    pub const HEIGHT: u8 = HEIGHT;

    /// Create a new display instance over `transport`
    pub fn new(transport: T) -> Self {
        Self {
            controller: Ssd1331::new(transport),
            framebuffer: Framebuffer::new(),
        }
    }

    /// Run the panel bring-up sequence
    pub fn initialize(&mut self) -> DisplayResult<()> {
        self.controller.initialize()
    }

    /// Bring-up has completed
    pub fn is_initialized(&self) -> bool {
        self.controller.is_initialized()
    }

    /// Get the framebuffer
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Get mutable access to the framebuffer
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        self.controller.transport()
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.controller.transport_mut()
    }

    /// Borrow the panel driver
    pub fn controller_mut(&mut self) -> &mut Ssd1331<T> {
        &mut self.controller
    }

    /// Split into transport and framebuffer
    pub fn into_parts(self) -> (T, Framebuffer) {
        (self.controller.release(), self.framebuffer)
    }

    /// Clear the framebuffer to a solid color
    pub fn clear(&mut self, color: Rgb565) {
        self.framebuffer.clear(color);
    }

    /// Fill a rectangle in the framebuffer, clipped to the panel
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> usize {
        self.framebuffer.fill_rect(x, y, w, h, color)
    }

    /// Blit a sprite into the framebuffer; returns pixels drawn
    pub fn blit_sprite(&mut self, sprite: &Sprite, x: i32, y: i32, fg: Rgb565) -> usize {
        self.framebuffer.blit_sprite(sprite, x, y, fg)
    }

    /// Blit a sprite that must end up at least partly visible
    ///
    /// Zero pixels from a non-empty sprite is [`DisplayError::NothingDrawn`];
    /// a zero-size sprite draws nothing and is not an error.
    pub fn blit_sprite_visible(
        &mut self,
        sprite: &Sprite,
        x: i32,
        y: i32,
        fg: Rgb565,
    ) -> DisplayResult<usize> {
        match self.framebuffer.blit_sprite(sprite, x, y, fg) {
            0 if sprite.is_empty() => Ok(0),
            0 => Err(DisplayError::NothingDrawn),
            drawn => Ok(drawn),
        }
    }

    /// Send the whole framebuffer
    pub fn flush_full_frame(&mut self) -> DisplayResult<FlushStats> {
        sync::flush_full(&mut self.controller, &self.framebuffer)
    }

    /// Send exactly the given dirty rectangles
    pub fn flush_dirty(&mut self, rects: &[Rect]) -> DisplayResult<FlushStats> {
        sync::flush_rects(&mut self.controller, &self.framebuffer, rects)
    }

    /// Send the rectangles actors vacated and now occupy
    pub fn sync_actors(&mut self, previous: &[Rect], current: &[Rect]) -> DisplayResult<FlushStats> {
        sync::compute_and_flush(&mut self.controller, &self.framebuffer, previous, current)
    }

    /// Panel-side window copy
    pub fn copy_window(&mut self, src: &Window, dst_x: u8, dst_y: u8) -> DisplayResult<()> {
        self.controller.copy_window(src, dst_x, dst_y)
    }

    /// Panel-side clear to black
    pub fn clear_window(&mut self, window: &Window) -> DisplayResult<()> {
        self.controller.clear_window(window)
    }

    /// Panel-side rectangle
    pub fn draw_rect(&mut self, window: &Window, outline: Rgb565, fill: Rgb565) -> DisplayResult<()> {
        self.controller.draw_rect(window, outline, fill)
    }

    /// Enable or disable panel-side rectangle fill
    pub fn set_fill(&mut self, enabled: bool) -> DisplayResult<()> {
        self.controller.set_fill(enabled)
    }

    /// Panel on or asleep
    pub fn set_display_on(&mut self, on: bool) -> DisplayResult<()> {
        self.controller.set_display_on(on)
    }

    /// Per-channel contrast
    pub fn set_contrast(&mut self, a: u8, b: u8, c: u8) -> DisplayResult<()> {
        self.controller.set_contrast(a, b, c)
    }
}
