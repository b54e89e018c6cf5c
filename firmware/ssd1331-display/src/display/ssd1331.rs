//! SSD1331 OLED Controller Driver
//!
//! Command/data protocol for the SSD1331 96×64 RGB565 OLED controller,
//! written against [`Transport`]. The driver keeps no copy of the panel's
//! column/row registers: every pixel transfer re-asserts its window first.

use log::{debug, trace};
use verus_builtin::*;
use verus_builtin_macros::*;

use super::framebuffer::{Framebuffer, Rgb565};
use super::sync::FlushStats;
use crate::error::{DisplayError, DisplayResult};
use crate::geometry::Window;
use crate::hal::{ControlLine, Mode, Transport};

/// Display dimensions
pub const WIDTH: u8 = 96;
pub const HEIGHT: u8 = 64;

/// SSD1331 commands
pub mod cmd {
    pub const SET_COLUMN: u8 = 0x15;
    pub const SET_ROW: u8 = 0x75;
    pub const DRAW_LINE: u8 = 0x21;
    pub const DRAW_RECT: u8 = 0x22;
    pub const COPY: u8 = 0x23;
    pub const DIM_WINDOW: u8 = 0x24;
    pub const CLEAR_WINDOW: u8 = 0x25;
    pub const FILL_ENABLE: u8 = 0x26;
    pub const SCROLL_SETUP: u8 = 0x27;
    pub const SCROLL_DISABLE: u8 = 0x2E;
    pub const SCROLL_ENABLE: u8 = 0x2F;
    pub const CONTRAST_A: u8 = 0x81;
    pub const CONTRAST_B: u8 = 0x82;
    pub const CONTRAST_C: u8 = 0x83;
    pub const MASTER_CURRENT: u8 = 0x87;
    pub const PRECHARGE_A: u8 = 0x8A;
    pub const PRECHARGE_B: u8 = 0x8B;
    pub const PRECHARGE_C: u8 = 0x8C;
    pub const REMAP: u8 = 0xA0;
    pub const START_LINE: u8 = 0xA1;
    pub const DISPLAY_OFFSET: u8 = 0xA2;
    pub const NORMAL_DISPLAY: u8 = 0xA4;
    pub const ALL_ON: u8 = 0xA5;
    pub const ALL_OFF: u8 = 0xA6;
    pub const INVERT_DISPLAY: u8 = 0xA7;
    pub const MULTIPLEX: u8 = 0xA8;
    pub const DIM_SETTINGS: u8 = 0xAB;
    pub const DISPLAY_DIM: u8 = 0xAC;
    pub const MASTER_CONFIG: u8 = 0xAD;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const POWER_SAVE: u8 = 0xB0;
    pub const PHASE_PERIOD: u8 = 0xB1;
    pub const CLOCK_DIV: u8 = 0xB3;
    pub const GRAY_TABLE: u8 = 0xB8;
    pub const LINEAR_GRAY: u8 = 0xB9;
    pub const PRECHARGE_LEVEL: u8 = 0xBB;
    pub const NOP: u8 = 0xBC;
    pub const VCOMH: u8 = 0xBE;
    pub const COMMAND_LOCK: u8 = 0xFD;

    /// Argument bytes following `opcode` in a command stream, `None` if the
    /// opcode is unknown
    pub const fn arg_count(opcode: u8) -> Option<usize> {
        match opcode {
            SET_COLUMN | SET_ROW => Some(2),
            DRAW_LINE => Some(7),
            DRAW_RECT => Some(10),
            COPY => Some(6),
            DIM_WINDOW | CLEAR_WINDOW => Some(4),
            FILL_ENABLE => Some(1),
            SCROLL_SETUP => Some(5),
            SCROLL_DISABLE | SCROLL_ENABLE => Some(0),
            CONTRAST_A | CONTRAST_B | CONTRAST_C | MASTER_CURRENT => Some(1),
            PRECHARGE_A | PRECHARGE_B | PRECHARGE_C => Some(1),
            REMAP | START_LINE | DISPLAY_OFFSET | MULTIPLEX | MASTER_CONFIG => Some(1),
            NORMAL_DISPLAY | ALL_ON | ALL_OFF | INVERT_DISPLAY => Some(0),
            DIM_SETTINGS => Some(5),
            DISPLAY_DIM | DISPLAY_OFF | DISPLAY_ON => Some(0),
            POWER_SAVE | PHASE_PERIOD | CLOCK_DIV | PRECHARGE_LEVEL | VCOMH => Some(1),
            GRAY_TABLE => Some(32),
            LINEAR_GRAY | NOP => Some(0),
            COMMAND_LOCK => Some(1),
            _ => None,
        }
    }
}

/// Register setup sent between the reset pulse and panel power-on, one
/// command transaction per entry
pub const INIT_SEQUENCE: &[&[u8]] = &[
    &[cmd::COMMAND_LOCK, 0x12],
    &[cmd::DISPLAY_OFF],
    &[cmd::REMAP, 0x72],
    &[cmd::START_LINE, 0x00],
    &[cmd::DISPLAY_OFFSET, 0x00],
    &[cmd::NORMAL_DISPLAY],
    &[cmd::MULTIPLEX, 0x3F],
    &[cmd::MASTER_CONFIG, 0x8E],
    &[cmd::POWER_SAVE, 0x0B],
    &[cmd::PHASE_PERIOD, 0x31],
    &[cmd::CLOCK_DIV, 0xF0],
    // A/B/C must be updated back to back
    &[cmd::PRECHARGE_A, 0x64, cmd::PRECHARGE_B, 0x78, cmd::PRECHARGE_C, 0x64],
    &[cmd::PRECHARGE_LEVEL, 0x3A],
    &[cmd::VCOMH, 0x3E],
    &[cmd::MASTER_CURRENT, 0x06],
    &[cmd::SET_COLUMN, 0x00, WIDTH - 1],
    &[cmd::SET_ROW, 0x00, HEIGHT - 1],
    &[cmd::CONTRAST_A, 0x91],
    &[cmd::CONTRAST_B, 0x50],
    &[cmd::CONTRAST_C, 0x7D],
    &[cmd::SCROLL_DISABLE],
    &[cmd::CLEAR_WINDOW, 0x00, 0x00, WIDTH - 1, HEIGHT - 1],
];

/// Power rail settle time before the reset pulse
const RAIL_SETTLE_MS: u32 = 20;
/// Each phase of the reset pulse
const RESET_PHASE_MS: u32 = 1;
/// Vcc ramp before display-on
const VCC_RAMP_MS: u32 = 25;
/// Panel settle after display-on
const DISPLAY_ON_MS: u32 = 100;

verus! {

/// Whether a window of the given size placed at `(x, y)` stays on the panel
pub fn fits_panel(x: u8, y: u8, w: usize, h: usize) -> (result: bool)
    ensures
        result ==> w >= 1 && h >= 1,
        result ==> x as usize + w <= WIDTH as usize,
        result ==> y as usize + h <= HEIGHT as usize,
{
    w >= 1 && h >= 1 && w <= WIDTH as usize && h <= HEIGHT as usize
        && x as usize <= WIDTH as usize - w
        && y as usize <= HEIGHT as usize - h
}

} // verus!

fn window_on_panel(window: &Window) -> bool {
    window.x0 <= window.x1
        && window.y0 <= window.y1
        && fits_panel(window.x0, window.y0, window.width(), window.height())
}

/// Panel-native 6-bit colour components: `(r5 << 1, g6, b5 << 1)`
pub fn native_color(color: Rgb565) -> [u8; 3] {
    [color.r5() << 1, color.g6(), color.b5() << 1]
}

/// SSD1331 driver
pub struct Ssd1331<T: Transport> {
    transport: T,
    initialized: bool,
}

impl<T: Transport> Ssd1331<T> {
    /// Create a driver; nothing is sent until [`initialize`](Self::initialize)
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            initialized: false,
        }
    }

    /// Bring-up has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn release(self) -> T {
        self.transport
    }

    fn ensure_initialized(&self) -> DisplayResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DisplayError::NotInitialized)
        }
    }

    /// Initialize the panel
    ///
    /// Power sequencing, reset pulse, [`INIT_SEQUENCE`], then Vcc and
    /// display-on. A second call fails with
    /// [`DisplayError::AlreadyInitialized`] without touching the bus.
    pub fn initialize(&mut self) -> DisplayResult<()> {
        if self.initialized {
            return Err(DisplayError::AlreadyInitialized);
        }

        debug!("ssd1331: power sequencing");
        self.transport.set_line(ControlLine::VccEnable, false)?;
        self.transport.set_line(ControlLine::PmodEnable, true)?;
        self.transport.delay_ms(RAIL_SETTLE_MS);

        debug!("ssd1331: reset pulse");
        self.transport.set_line(ControlLine::Reset, false)?;
        self.transport.delay_ms(RESET_PHASE_MS);
        self.transport.set_line(ControlLine::Reset, true)?;
        self.transport.delay_ms(RESET_PHASE_MS);
        self.transport.set_line(ControlLine::Reset, false)?;
        self.transport.delay_ms(RESET_PHASE_MS);

        debug!("ssd1331: {} setup commands", INIT_SEQUENCE.len());
        for command in INIT_SEQUENCE {
            self.transport.command(command)?;
        }

        self.transport.set_line(ControlLine::VccEnable, true)?;
        self.transport.delay_ms(VCC_RAMP_MS);
        self.transport.command(&[cmd::DISPLAY_ON])?;
        self.transport.delay_ms(DISPLAY_ON_MS);

        self.initialized = true;
        debug!("ssd1331: display on");
        Ok(())
    }

    /// Point the column/row address registers at `window`
    pub fn set_window(&mut self, window: &Window) -> DisplayResult<()> {
        self.transport
            .command(&[cmd::SET_COLUMN, window.x0, window.x1])?;
        self.transport.command(&[cmd::SET_ROW, window.y0, window.y1])
    }

    /// Stream the framebuffer pixels inside `window` to the panel
    ///
    /// Sets the window, then sends every row in one data transaction,
    /// big-endian per pixel.
    pub fn write_window(&mut self, window: &Window, fb: &Framebuffer) -> DisplayResult<FlushStats> {
        self.ensure_initialized()?;
        if !window_on_panel(window) {
            return Err(DisplayError::OutOfBounds);
        }
        self.set_window(window)?;

        self.transport.begin(Mode::Data)?;
        let streamed = self.stream_rows(window, fb);
        // close the transaction even if a row failed
        let ended = self.transport.end();
        streamed.and(ended)?;

        trace!(
            "ssd1331: window ({},{})-({},{})",
            window.x0,
            window.y0,
            window.x1,
            window.y1
        );
        Ok(FlushStats::window(window.pixel_count()))
    }

    fn stream_rows(&mut self, window: &Window, fb: &Framebuffer) -> DisplayResult<()> {
        let mut line = [0u8; WIDTH as usize * 2];
        for y in window.y0..=window.y1 {
            let pixels = fb.window_row(window, y);
            for (out, &px) in line.chunks_exact_mut(2).zip(pixels) {
                out.copy_from_slice(&px.to_be_bytes());
            }
            self.transport.send(&line[..pixels.len() * 2])?;
        }
        Ok(())
    }

    /// Panel-side copy of `src` to top-left `(dst_x, dst_y)`
    ///
    /// Overlapping source and destination are not detected here.
    pub fn copy_window(&mut self, src: &Window, dst_x: u8, dst_y: u8) -> DisplayResult<()> {
        self.ensure_initialized()?;
        if !window_on_panel(src) || !fits_panel(dst_x, dst_y, src.width(), src.height()) {
            return Err(DisplayError::OutOfBounds);
        }
        debug!(
            "ssd1331: copy ({},{})-({},{}) -> ({},{})",
            src.x0, src.y0, src.x1, src.y1, dst_x, dst_y
        );
        self.transport
            .command(&[cmd::COPY, src.x0, src.y0, src.x1, src.y1, dst_x, dst_y])
    }

    /// Panel-side clear of `window` to black
    pub fn clear_window(&mut self, window: &Window) -> DisplayResult<()> {
        self.ensure_initialized()?;
        if !window_on_panel(window) {
            return Err(DisplayError::OutOfBounds);
        }
        debug!(
            "ssd1331: clear ({},{})-({},{})",
            window.x0, window.y0, window.x1, window.y1
        );
        self.transport.command(&[
            cmd::CLEAR_WINDOW,
            window.x0,
            window.y0,
            window.x1,
            window.y1,
        ])
    }

    /// Enable or disable rectangle fill for [`draw_rect`](Self::draw_rect)
    pub fn set_fill(&mut self, enabled: bool) -> DisplayResult<()> {
        self.ensure_initialized()?;
        self.transport
            .command(&[cmd::FILL_ENABLE, if enabled { 0x01 } else { 0x00 }])
    }

    /// Panel-side rectangle: outline always, interior if fill is enabled
    pub fn draw_rect(&mut self, window: &Window, outline: Rgb565, fill: Rgb565) -> DisplayResult<()> {
        self.ensure_initialized()?;
        if !window_on_panel(window) {
            return Err(DisplayError::OutOfBounds);
        }
        let [or, og, ob] = native_color(outline);
        let [fr, fg, fb] = native_color(fill);
        self.transport.command(&[
            cmd::DRAW_RECT,
            window.x0,
            window.y0,
            window.x1,
            window.y1,
            or,
            og,
            ob,
            fr,
            fg,
            fb,
        ])
    }

    /// Display on (`AF`) or sleep (`AE`)
    pub fn set_display_on(&mut self, on: bool) -> DisplayResult<()> {
        self.ensure_initialized()?;
        let op = if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF };
        self.transport.command(&[op])
    }

    /// Per-channel contrast, one transaction each
    pub fn set_contrast(&mut self, a: u8, b: u8, c: u8) -> DisplayResult<()> {
        self.ensure_initialized()?;
        self.transport.command(&[cmd::CONTRAST_A, a])?;
        self.transport.command(&[cmd::CONTRAST_B, b])?;
        self.transport.command(&[cmd::CONTRAST_C, c])
    }
}
