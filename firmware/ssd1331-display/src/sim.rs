//! SSD1331 panel simulator
//!
//! A host-side model of the controller behind a [`Transport`]. Command bytes
//! are decoded with their argument counts and applied to a model GDDRAM;
//! data bytes are written through the column/row window exactly as the
//! controller's address pointer would. Every transaction, line change and
//! delay is recorded for inspection.
//!
//! The model is strict: framing mistakes and unknown opcodes are reported as
//! [`DisplayError::Protocol`] instead of being ignored.

use log::trace;

use crate::display::ssd1331::{cmd, HEIGHT, WIDTH};
use crate::display::Rgb565;
use crate::error::{DisplayError, DisplayResult, WaitCondition};
use crate::geometry::Window;
use crate::hal::{ControlLine, Mode, Transport};

const PIXELS: usize = WIDTH as usize * HEIGHT as usize;

/// Observable transport activity, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// One command transaction and its bytes
    Command(Vec<u8>),
    /// One data transaction and its bytes
    Data(Vec<u8>),
    /// Control line driven
    Line(ControlLine, bool),
    /// Delay requested, milliseconds
    Delay(u32),
}

/// Running byte counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub transactions: usize,
    pub command_bytes: usize,
    pub data_bytes: usize,
    pub delay_ms: u64,
}

/// Simulated SSD1331 panel
pub struct SimPanel {
    gddram: Vec<u16>,
    window: Window,
    col: u8,
    row: u8,
    /// Opcode and arguments collected so far
    pending: Vec<u8>,
    /// High byte of a pixel waiting for its low byte
    half_pixel: Option<u8>,
    open: Option<Mode>,
    current: Vec<u8>,
    display_on: bool,
    fill_enabled: bool,
    locked: bool,
    contrast: [u8; 3],
    vcc_enabled: bool,
    pmod_enabled: bool,
    in_reset: bool,
    events: Vec<Event>,
    recording: bool,
    counters: Counters,
    fail_after: Option<usize>,
}

impl SimPanel {
    /// Panel with black GDDRAM, display off, full-screen window
    pub fn new() -> Self {
        Self {
            gddram: vec![0; PIXELS],
            window: Window::full(WIDTH, HEIGHT),
            col: 0,
            row: 0,
            pending: Vec::new(),
            half_pixel: None,
            open: None,
            current: Vec::new(),
            display_on: false,
            fill_enabled: false,
            locked: false,
            contrast: [0x80; 3],
            vcc_enabled: false,
            pmod_enabled: false,
            in_reset: false,
            events: Vec::new(),
            recording: true,
            counters: Counters::default(),
            fail_after: None,
        }
    }

    /// Panel memory, row-major
    pub fn gddram(&self) -> &[u16] {
        &self.gddram
    }

    /// One panel pixel
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
            return None;
        }
        Some(Rgb565(self.gddram[y as usize * WIDTH as usize + x as usize]))
    }

    /// Recorded events since the last [`clear_log`](Self::clear_log)
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Bytes of every recorded command transaction
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded events
    pub fn clear_log(&mut self) {
        self.events.clear();
    }

    /// Stop or resume recording events; counters always run
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Byte counters since creation or the last [`reset_counters`](Self::reset_counters)
    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = Counters::default();
    }

    /// Make `send` time out once `bytes` more bytes have been accepted
    pub fn fail_after(&mut self, bytes: usize) {
        self.fail_after = Some(bytes);
    }

    /// A transaction is open
    pub fn is_framing(&self) -> bool {
        self.open.is_some()
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    pub fn is_fill_enabled(&self) -> bool {
        self.fill_enabled
    }

    pub fn contrast(&self) -> [u8; 3] {
        self.contrast
    }

    /// Current column/row address window
    pub fn window(&self) -> Window {
        self.window
    }

    /// Vcc rail and Pmod supply state
    pub fn power(&self) -> (bool, bool) {
        (self.vcc_enabled, self.pmod_enabled)
    }

    fn record(&mut self, event: Event) {
        if self.recording {
            self.events.push(event);
        }
    }

    /// Register state after a hardware reset; GDDRAM keeps its contents
    fn reset_registers(&mut self) {
        self.window = Window::full(WIDTH, HEIGHT);
        self.col = 0;
        self.row = 0;
        self.pending.clear();
        self.half_pixel = None;
        self.display_on = false;
        self.fill_enabled = false;
        self.locked = false;
        self.contrast = [0x80; 3];
    }

    fn command_byte(&mut self, byte: u8) -> DisplayResult<()> {
        self.pending.push(byte);
        let opcode = self.pending[0];
        let Some(args) = cmd::arg_count(opcode) else {
            self.pending.clear();
            return Err(DisplayError::Protocol("unknown opcode"));
        };
        if self.pending.len() <= args {
            return Ok(());
        }
        let bytes = core::mem::take(&mut self.pending);
        self.execute(opcode, &bytes[1..])
    }

    fn execute(&mut self, opcode: u8, args: &[u8]) -> DisplayResult<()> {
        trace!("sim: {:02X} {:02X?}", opcode, args);
        if self.locked && opcode != cmd::COMMAND_LOCK {
            return Ok(());
        }
        match opcode {
            cmd::SET_COLUMN => {
                let (start, end) = checked_range(args[0], args[1], WIDTH)?;
                self.window.x0 = start;
                self.window.x1 = end;
                self.col = start;
            }
            cmd::SET_ROW => {
                let (start, end) = checked_range(args[0], args[1], HEIGHT)?;
                self.window.y0 = start;
                self.window.y1 = end;
                self.row = start;
            }
            cmd::COPY => {
                let src = window_arg(&args[..4])?;
                self.copy(&src, args[4], args[5]);
            }
            cmd::CLEAR_WINDOW => {
                let window = window_arg(args)?;
                self.paint(&window, |_, _| Some(0));
            }
            cmd::DRAW_RECT => {
                let window = window_arg(&args[..4])?;
                let outline = from_native(&args[4..7]);
                let fill = from_native(&args[7..10]);
                let fill_enabled = self.fill_enabled;
                self.paint(&window, |x, y| {
                    let edge = x == window.x0 || x == window.x1 || y == window.y0 || y == window.y1;
                    if edge {
                        Some(outline)
                    } else if fill_enabled {
                        Some(fill)
                    } else {
                        None
                    }
                });
            }
            cmd::FILL_ENABLE => self.fill_enabled = args[0] & 0x01 != 0,
            cmd::CONTRAST_A => self.contrast[0] = args[0],
            cmd::CONTRAST_B => self.contrast[1] = args[0],
            cmd::CONTRAST_C => self.contrast[2] = args[0],
            cmd::DISPLAY_ON => self.display_on = true,
            cmd::DISPLAY_OFF => self.display_on = false,
            cmd::COMMAND_LOCK => self.locked = args[0] == 0x16,
            // accepted, no effect on the model
            _ => {}
        }
        Ok(())
    }

    fn data_byte(&mut self, byte: u8) {
        match self.half_pixel.take() {
            None => self.half_pixel = Some(byte),
            Some(high) => self.write_pixel(u16::from_be_bytes([high, byte])),
        }
    }

    fn write_pixel(&mut self, value: u16) {
        let idx = self.row as usize * WIDTH as usize + self.col as usize;
        self.gddram[idx] = value;

        if self.col >= self.window.x1 {
            self.col = self.window.x0;
            self.row = if self.row >= self.window.y1 {
                self.window.y0
            } else {
                self.row + 1
            };
        } else {
            self.col += 1;
        }
    }

    fn paint(&mut self, window: &Window, mut color: impl FnMut(u8, u8) -> Option<u16>) {
        for y in window.y0..=window.y1 {
            for x in window.x0..=window.x1 {
                if let Some(c) = color(x, y) {
                    self.gddram[y as usize * WIDTH as usize + x as usize] = c;
                }
            }
        }
    }

    /// Row-major in-place copy, clipped at the panel edge like the controller
    fn copy(&mut self, src: &Window, dst_x: u8, dst_y: u8) {
        for dy in 0..src.height() {
            for dx in 0..src.width() {
                let tx = dst_x as usize + dx;
                let ty = dst_y as usize + dy;
                if tx >= WIDTH as usize || ty >= HEIGHT as usize {
                    continue;
                }
                let sx = src.x0 as usize + dx;
                let sy = src.y0 as usize + dy;
                self.gddram[ty * WIDTH as usize + tx] = self.gddram[sy * WIDTH as usize + sx];
            }
        }
    }
}

impl Default for SimPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_range(start: u8, end: u8, limit: u8) -> DisplayResult<(u8, u8)> {
    if start > end || end >= limit {
        return Err(DisplayError::Protocol("address range outside panel"));
    }
    Ok((start, end))
}

fn window_arg(args: &[u8]) -> DisplayResult<Window> {
    let (x0, x1) = checked_range(args[0], args[2], WIDTH)?;
    let (y0, y1) = checked_range(args[1], args[3], HEIGHT)?;
    Ok(Window { x0, y0, x1, y1 })
}

/// Panel-native 6-bit components back to RGB565
fn from_native(c: &[u8]) -> u16 {
    let r5 = (c[0] >> 1) as u16 & 0x1F;
    let g6 = c[1] as u16 & 0x3F;
    let b5 = (c[2] >> 1) as u16 & 0x1F;
    (r5 << 11) | (g6 << 5) | b5
}

impl Transport for SimPanel {
    fn begin(&mut self, mode: Mode) -> DisplayResult<()> {
        if self.open.is_some() {
            return Err(DisplayError::Protocol("nested transaction"));
        }
        if self.in_reset {
            return Err(DisplayError::Protocol("transaction while in reset"));
        }
        self.open = Some(mode);
        self.current.clear();
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        let mode = self
            .open
            .ok_or(DisplayError::Protocol("send outside transaction"))?;
        for &byte in bytes {
            if let Some(left) = self.fail_after.as_mut() {
                if *left == 0 {
                    return Err(DisplayError::Timeout(WaitCondition::TxReady));
                }
                *left -= 1;
            }
            if self.recording {
                self.current.push(byte);
            }
            match mode {
                Mode::Command => {
                    self.counters.command_bytes += 1;
                    self.command_byte(byte)?;
                }
                Mode::Data => {
                    self.counters.data_bytes += 1;
                    self.data_byte(byte);
                }
            }
        }
        Ok(())
    }

    fn end(&mut self) -> DisplayResult<()> {
        let mode = self
            .open
            .take()
            .ok_or(DisplayError::Protocol("end without begin"))?;
        self.counters.transactions += 1;
        let bytes = core::mem::take(&mut self.current);
        self.record(match mode {
            Mode::Command => Event::Command(bytes),
            Mode::Data => Event::Data(bytes),
        });
        if mode == Mode::Data && self.half_pixel.take().is_some() {
            return Err(DisplayError::Protocol("odd number of pixel bytes"));
        }
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.counters.delay_ms += ms as u64;
        self.record(Event::Delay(ms));
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> DisplayResult<()> {
        match line {
            ControlLine::Reset => {
                if asserted {
                    self.reset_registers();
                }
                self.in_reset = asserted;
            }
            ControlLine::VccEnable => self.vcc_enabled = asserted,
            ControlLine::PmodEnable => self.pmod_enabled = asserted,
        }
        self.record(Event::Line(line, asserted));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_data_follows_window() {
        let mut sim = SimPanel::new();
        sim.command(&hex!("15 02 03")).unwrap();
        sim.command(&hex!("75 05 06")).unwrap();
        sim.data(&hex!("00 01 00 02 00 03 00 04")).unwrap();
        assert_eq!(sim.pixel(2, 5), Some(Rgb565(1)));
        assert_eq!(sim.pixel(3, 5), Some(Rgb565(2)));
        assert_eq!(sim.pixel(2, 6), Some(Rgb565(3)));
        assert_eq!(sim.pixel(3, 6), Some(Rgb565(4)));
        // pointer wraps back to the window origin
        sim.data(&hex!("00 09")).unwrap();
        assert_eq!(sim.pixel(2, 5), Some(Rgb565(9)));
    }

    #[test]
    fn test_arguments_may_span_sends() {
        let mut sim = SimPanel::new();
        sim.begin(Mode::Command).unwrap();
        sim.send(&[0x15]).unwrap();
        sim.send(&[0x10, 0x20]).unwrap();
        sim.end().unwrap();
        assert_eq!(sim.window(), Window { x0: 0x10, y0: 0, x1: 0x20, y1: 63 });
    }

    #[test]
    fn test_copy_and_clear() {
        let mut sim = SimPanel::new();
        sim.command(&hex!("15 00 01")).unwrap();
        sim.command(&hex!("75 00 00")).unwrap();
        sim.data(&hex!("AB CD 12 34")).unwrap();

        sim.command(&hex!("23 00 00 01 00 10 08")).unwrap();
        assert_eq!(sim.pixel(16, 8), Some(Rgb565(0xABCD)));
        assert_eq!(sim.pixel(17, 8), Some(Rgb565(0x1234)));

        sim.command(&hex!("25 00 00 00 00")).unwrap();
        assert_eq!(sim.pixel(0, 0), Some(Rgb565::BLACK));
        assert_eq!(sim.pixel(1, 0), Some(Rgb565(0x1234)));
    }

    #[test]
    fn test_draw_rect_with_and_without_fill() {
        let mut sim = SimPanel::new();
        sim.command(&hex!("22 00 00 03 03 3E 00 00 00 00 3E")).unwrap();
        assert_eq!(sim.pixel(0, 0), Some(Rgb565::RED));
        assert_eq!(sim.pixel(1, 1), Some(Rgb565::BLACK));

        sim.command(&hex!("26 01")).unwrap();
        sim.command(&hex!("22 00 00 03 03 3E 00 00 00 00 3E")).unwrap();
        assert_eq!(sim.pixel(3, 3), Some(Rgb565::RED));
        assert_eq!(sim.pixel(1, 2), Some(Rgb565::BLUE));
    }

    #[test]
    fn test_strict_framing() {
        let mut sim = SimPanel::new();
        assert_eq!(
            sim.send(&[0]),
            Err(DisplayError::Protocol("send outside transaction"))
        );
        assert_eq!(sim.end(), Err(DisplayError::Protocol("end without begin")));
        sim.begin(Mode::Command).unwrap();
        assert_eq!(
            sim.begin(Mode::Data),
            Err(DisplayError::Protocol("nested transaction"))
        );
        assert_eq!(sim.send(&[0x00]), Err(DisplayError::Protocol("unknown opcode")));
    }

    #[test]
    fn test_odd_pixel_bytes_rejected() {
        let mut sim = SimPanel::new();
        sim.begin(Mode::Data).unwrap();
        sim.send(&[0xFF]).unwrap();
        assert_eq!(
            sim.end(),
            Err(DisplayError::Protocol("odd number of pixel bytes"))
        );
    }

    #[test]
    fn test_reset_restores_registers() {
        let mut sim = SimPanel::new();
        sim.command(&hex!("AF")).unwrap();
        sim.command(&hex!("15 10 20")).unwrap();
        sim.set_line(ControlLine::Reset, true).unwrap();
        assert!(sim.begin(Mode::Command).is_err());
        sim.set_line(ControlLine::Reset, false).unwrap();
        assert!(!sim.is_display_on());
        assert_eq!(sim.window(), Window::full(WIDTH, HEIGHT));
    }

    #[test]
    fn test_injected_timeout() {
        let mut sim = SimPanel::new();
        sim.fail_after(2);
        sim.begin(Mode::Data).unwrap();
        assert_eq!(
            sim.send(&[1, 2, 3]),
            Err(DisplayError::Timeout(WaitCondition::TxReady))
        );
    }

    #[test]
    fn test_counters() {
        let mut sim = SimPanel::new();
        sim.set_recording(false);
        sim.command(&hex!("15 00 5F")).unwrap();
        sim.data(&[0; 8]).unwrap();
        sim.delay_ms(5);
        assert!(sim.events().is_empty());
        assert_eq!(
            sim.counters(),
            Counters {
                transactions: 2,
                command_bytes: 3,
                data_bytes: 8,
                delay_ms: 5,
            }
        );
    }
}
