//! Verified SSD1331 OLED Rendering Core
//!
//! This crate drives a 96×64 RGB565 SSD1331 OLED panel over the SoC's
//! memory-mapped SPI controller. Drawing happens in a software framebuffer;
//! only the regions that changed are streamed to the panel.
//!
//! # Architecture
//!
//! ```text
//! Application (scene / game loop)
//!     │
//!     ▼
//! ┌──────────────┐    ┌──────────────┐
//! │ Framebuffer  │◄───│  Sprite 1bpp │
//! │ (RGB565)     │    │  blitter     │
//! └──────┬───────┘    └──────────────┘
//!        │ dirty windows
//!        ▼
//! ┌──────────────┐
//! │ SSD1331      │
//! │ protocol     │
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐      ┌──────────────┐
//! │ Transport    │◄─────│ Simulator    │ (host, `std`)
//! │ (SPI master) │      └──────────────┘
//! └──────┬───────┘
//!        ▼
//!   MMIO registers
//! ```
//!
//! # Verification
//!
//! Window clipping in [`geometry`] is written with Verus contracts:
//! - every window handed to the panel lies inside the panel
//! - empty and fully off-screen rectangles never produce a window
//!
//! The contracts are erased in normal builds.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(clippy::new_without_default)]

pub mod display;
pub mod error;
pub mod geometry;
pub mod hal;
pub mod scene;
#[cfg(any(test, feature = "std"))]
pub mod sim;

// Re-export main types
pub use display::{rgb565, Display, FlushStats, Framebuffer, Rgb565, Sprite, HEIGHT, WIDTH};
pub use error::{DisplayError, DisplayResult, SpriteError, WaitCondition};
pub use geometry::{Rect, Window};
pub use hal::{ControlLine, Mode, Transport};
