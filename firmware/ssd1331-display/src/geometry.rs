//! Rectangles and panel windows
//!
//! A [`Rect`] is a signed region in framebuffer coordinates. It may be empty
//! (non-positive width or height) or partially off-screen. A [`Window`] is
//! what the panel's column/row address registers accept: inclusive, unsigned
//! and always inside the panel. [`Rect::clip`] is the only way from one to
//! the other.

use verus_builtin::*;
use verus_builtin_macros::*;

verus! {

/// Signed rectangle in framebuffer coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Inclusive panel window, always within the panel it was clipped against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x0: u8,
    pub y0: u8,
    pub x1: u8,
    pub y1: u8,
}

impl Rect {
    /// Create a rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> (r: Self)
        ensures
            r.x == x,
            r.y == y,
            r.w == w,
            r.h == h,
    {
        Rect { x, y, w, h }
    }

    /// Non-positive width or height
    pub fn is_empty(&self) -> (result: bool)
        ensures
            result == (self.w <= 0 || self.h <= 0),
    {
        self.w <= 0 || self.h <= 0
    }

    /// Clip to a `width × height` panel
    ///
    /// Returns `None` for empty rectangles and rectangles entirely outside
    /// the panel. Edges are computed in 64-bit so extreme inputs cannot wrap.
    pub fn clip(&self, width: u8, height: u8) -> (result: Option<Window>)
        ensures
            result.is_some() ==> self.w > 0 && self.h > 0,
            result.is_some() ==> result.unwrap().x0 <= result.unwrap().x1,
            result.is_some() ==> result.unwrap().y0 <= result.unwrap().y1,
            result.is_some() ==> result.unwrap().x1 < width,
            result.is_some() ==> result.unwrap().y1 < height,
    {
        if self.w <= 0 || self.h <= 0 || width == 0 || height == 0 {
            return None;
        }

        let mut x0 = self.x as i64;
        let mut y0 = self.y as i64;
        let mut x1 = self.x as i64 + self.w as i64 - 1;
        let mut y1 = self.y as i64 + self.h as i64 - 1;

        if x0 < 0 {
            x0 = 0;
        }
        if y0 < 0 {
            y0 = 0;
        }
        if x1 >= width as i64 {
            x1 = width as i64 - 1;
        }
        if y1 >= height as i64 {
            y1 = height as i64 - 1;
        }

        if x1 < x0 || y1 < y0 {
            return None;
        }

        Some(Window {
            x0: x0 as u8,
            y0: y0 as u8,
            x1: x1 as u8,
            y1: y1 as u8,
        })
    }
}

impl Window {
    /// Columns covered
    pub fn width(&self) -> (w: usize)
        requires
            self.x0 <= self.x1,
        ensures
            w >= 1,
    {
        (self.x1 - self.x0) as usize + 1
    }

    /// Rows covered
    pub fn height(&self) -> (h: usize)
        requires
            self.y0 <= self.y1,
        ensures
            h >= 1,
    {
        (self.y1 - self.y0) as usize + 1
    }
}

} // verus!

impl Rect {
    /// True if `(px, py)` lies inside the rectangle
    pub fn contains(&self, px: i32, py: i32) -> bool {
        !self.is_empty()
            && (px as i64) >= self.x as i64
            && (py as i64) >= self.y as i64
            && (px as i64) < self.x as i64 + self.w as i64
            && (py as i64) < self.y as i64 + self.h as i64
    }

    /// Axis-aligned overlap test; empty rectangles overlap nothing
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (ax, ay) = (self.x as i64, self.y as i64);
        let (bx, by) = (other.x as i64, other.y as i64);
        ax < bx + other.w as i64
            && ax + self.w as i64 > bx
            && ay < by + other.h as i64
            && ay + self.h as i64 > by
    }

    /// Same size, moved to `(x, y)`
    pub fn moved_to(&self, x: i32, y: i32) -> Rect {
        Rect { x, y, ..*self }
    }
}

impl Window {
    /// Whole-panel window
    pub fn full(width: u8, height: u8) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width.saturating_sub(1),
            y1: height.saturating_sub(1),
        }
    }

    /// Number of pixels inside the window
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Back to a signed rectangle
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x0 as i32,
            self.y0 as i32,
            self.width() as i32,
            self.height() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_negative_origin() {
        let w = Rect::new(-5, -5, 20, 20).clip(96, 64).unwrap();
        assert_eq!(w, Window { x0: 0, y0: 0, x1: 14, y1: 14 });
        assert_eq!(w.pixel_count(), 15 * 15);
    }

    #[test]
    fn test_clip_far_edge() {
        let w = Rect::new(90, 60, 10, 10).clip(96, 64).unwrap();
        assert_eq!(w, Window { x0: 90, y0: 60, x1: 95, y1: 63 });
    }

    #[test]
    fn test_clip_rejects_empty_and_outside() {
        assert!(Rect::new(0, 0, 0, 10).clip(96, 64).is_none());
        assert!(Rect::new(0, 0, 10, -1).clip(96, 64).is_none());
        assert!(Rect::new(96, 0, 4, 4).clip(96, 64).is_none());
        assert!(Rect::new(-10, 0, 10, 4).clip(96, 64).is_none());
        assert!(Rect::new(0, 64, 4, 4).clip(96, 64).is_none());
    }

    #[test]
    fn test_clip_extreme_values_do_not_wrap() {
        let w = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX).clip(96, 64);
        assert!(w.is_none());
        let w = Rect::new(10, 10, i32::MAX, i32::MAX).clip(96, 64).unwrap();
        assert_eq!(w, Window { x0: 10, y0: 10, x1: 95, y1: 63 });
    }

    #[test]
    fn test_overlaps() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.overlaps(&Rect::new(9, 9, 5, 5)));
        assert!(!a.overlaps(&Rect::new(10, 0, 5, 5)));
        assert!(!a.overlaps(&Rect::new(0, 0, 0, 5)));
    }

    #[test]
    fn test_contains() {
        let a = Rect::new(2, 3, 4, 5);
        assert!(a.contains(2, 3));
        assert!(a.contains(5, 7));
        assert!(!a.contains(6, 7));
        assert!(!Rect::new(0, 0, 0, 0).contains(0, 0));
    }
}
