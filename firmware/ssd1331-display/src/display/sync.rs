//! Dirty-rectangle sync
//!
//! Streams only the framebuffer regions named by a dirty list. Rectangles are
//! sent independently, never merged: overlaps and duplicates cost extra bus
//! time but never correctness.

use super::framebuffer::Framebuffer;
use super::ssd1331::{Ssd1331, HEIGHT, WIDTH};
use crate::error::DisplayResult;
use crate::geometry::{Rect, Window};
use crate::hal::Transport;

/// Bus usage of one or more windowed transfers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Windowed transfers (one column/row setup plus one data transaction each)
    pub transfers: usize,
    /// Pixels streamed
    pub pixels: usize,
    /// Pixel data bytes streamed
    pub bytes: usize,
}

impl FlushStats {
    /// Stats of a single window of `pixels`
    pub const fn window(pixels: usize) -> Self {
        Self {
            transfers: 1,
            pixels,
            bytes: pixels * 2,
        }
    }

    /// Accumulate another flush
    pub fn merge(&mut self, other: FlushStats) {
        self.transfers += other.transfers;
        self.pixels += other.pixels;
        self.bytes += other.bytes;
    }

    /// Nothing was sent
    pub fn is_empty(&self) -> bool {
        self.transfers == 0
    }
}

impl core::ops::Add for FlushStats {
    type Output = FlushStats;

    fn add(mut self, rhs: FlushStats) -> FlushStats {
        self.merge(rhs);
        self
    }
}

/// Send each rectangle of `rects` that survives clipping
///
/// Empty and fully off-screen rectangles are skipped silently.
pub fn flush_rects<T: Transport>(
    panel: &mut Ssd1331<T>,
    fb: &Framebuffer,
    rects: &[Rect],
) -> DisplayResult<FlushStats> {
    let mut stats = FlushStats::default();
    for window in rects.iter().filter_map(|r| r.clip(WIDTH, HEIGHT)) {
        stats.merge(panel.write_window(&window, fb)?);
    }
    Ok(stats)
}

/// Flush the regions actors left (`previous`) and now occupy (`current`)
///
/// The framebuffer must already hold the fully redrawn frame. Candidates are
/// every previous rectangle followed by every current one.
pub fn compute_and_flush<T: Transport>(
    panel: &mut Ssd1331<T>,
    fb: &Framebuffer,
    previous: &[Rect],
    current: &[Rect],
) -> DisplayResult<FlushStats> {
    let mut stats = flush_rects(panel, fb, previous)?;
    stats.merge(flush_rects(panel, fb, current)?);
    Ok(stats)
}

/// Send the whole framebuffer as one window
pub fn flush_full<T: Transport>(panel: &mut Ssd1331<T>, fb: &Framebuffer) -> DisplayResult<FlushStats> {
    panel.write_window(&Window::full(WIDTH, HEIGHT), fb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Rgb565;
    use crate::sim::SimPanel;

    fn ready() -> Ssd1331<SimPanel> {
        let mut oled = Ssd1331::new(SimPanel::new());
        oled.initialize().unwrap();
        oled.transport_mut().clear_log();
        oled
    }

    /// Small deterministic generator for rectangle pairs
    struct XorShift(u32);

    impl XorShift {
        fn next(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }

        fn range(&mut self, lo: i32, hi: i32) -> i32 {
            lo + (self.next() % (hi - lo) as u32) as i32
        }

        fn rect(&mut self) -> Rect {
            Rect::new(
                self.range(-20, 100),
                self.range(-20, 70),
                self.range(-2, 30),
                self.range(-2, 30),
            )
        }
    }

    #[test]
    fn test_zero_candidates() {
        let mut oled = ready();
        let fb = Framebuffer::new();
        let stats = compute_and_flush(&mut oled, &fb, &[], &[]).unwrap();
        assert_eq!(stats, FlushStats::default());
        assert!(oled.transport().events().is_empty());
    }

    #[test]
    fn test_skips_empty_and_offscreen() {
        let mut oled = ready();
        let fb = Framebuffer::new();
        let rects = [
            Rect::new(5, 5, 0, 3),
            Rect::new(200, 5, 3, 3),
            Rect::new(-1, -1, 2, 2),
        ];
        let stats = flush_rects(&mut oled, &fb, &rects).unwrap();
        assert_eq!(stats, FlushStats::window(1));
    }

    #[test]
    fn test_duplicates_sent_independently() {
        let mut oled = ready();
        let fb = Framebuffer::new();
        let r = Rect::new(0, 0, 4, 4);
        let stats = compute_and_flush(&mut oled, &fb, &[r], &[r]).unwrap();
        assert_eq!(stats.transfers, 2);
        assert_eq!(stats.pixels, 32);
    }

    #[test]
    fn test_window_reasserted_every_flush() {
        let mut oled = ready();
        let fb = Framebuffer::new();
        let r = [Rect::new(8, 8, 4, 4)];
        flush_rects(&mut oled, &fb, &r).unwrap();
        flush_rects(&mut oled, &fb, &r).unwrap();
        let commands = oled.transport().commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], commands[2]);
        assert_eq!(commands[0][0], 0x15);
        assert_eq!(commands[1][0], 0x75);
        assert_eq!(commands[3][0], 0x75);
    }

    #[test]
    fn test_dirty_completeness() {
        let mut rng = XorShift(0x1234_5678);
        let mut oled = ready();
        let mut fb = Framebuffer::new();
        flush_full(&mut oled, &fb).unwrap();

        for frame in 0..200 {
            let prev = [rng.rect(), rng.rect()];
            let cur: [Rect; 2] = [rng.rect(), rng.rect()];

            // frame: background, actors drawn at their current rects
            let bg = if frame % 3 == 0 { Rgb565::BLACK } else { Rgb565(0x0841) };
            fb.clear(bg);
            for (i, r) in cur.iter().enumerate() {
                fb.fill_rect(r.x, r.y, r.w, r.h, Rgb565(0xF000 | i as u16));
            }
            // panel previously showed actors at `prev` over the same background
            let mut shown = Framebuffer::new();
            shown.clear(bg);
            for (i, r) in prev.iter().enumerate() {
                shown.fill_rect(r.x, r.y, r.w, r.h, Rgb565(0xF000 | i as u16));
            }
            flush_full(&mut oled, &shown).unwrap();

            compute_and_flush(&mut oled, &fb, &prev, &cur).unwrap();
            assert_eq!(
                oled.transport().gddram(),
                fb.as_slice(),
                "panel diverged at frame {}",
                frame
            );
        }
    }
}
