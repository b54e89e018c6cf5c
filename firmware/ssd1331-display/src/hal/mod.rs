//! Hardware Abstraction Layer for the SoC's SPI/OLED port
//!
//! Provides:
//! - the [`Transport`] contract the display protocol is written against
//! - register access ([`mmio`])
//! - the OLED control latch: CS#, D/C#, RES#, VCCEN, PMODEN ([`gpio`])
//! - the SPI master implementing [`Transport`] ([`spi`])

pub mod gpio;
pub mod mmio;
pub mod spi;

pub use gpio::GpioLatch;
pub use mmio::{Mmio, RegisterBus};
pub use spi::{SpiConfig, SpiMaster, WaitPolicy};

use crate::error::DisplayResult;

/// Transaction mode, selected by the D/C# line before chip select
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// D/C# low: bytes are opcodes and their arguments
    Command,
    /// D/C# high: bytes are written to display RAM at the window pointer
    Data,
}

/// Panel control lines outside the serial framing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlLine {
    /// RES# (asserted = low = panel held in reset)
    Reset,
    /// Panel Vcc rail enable (asserted = rail on)
    VccEnable,
    /// Pmod 3.3V supply enable (asserted = supply on)
    PmodEnable,
}

/// Blocking, ordered serial transport to the panel
///
/// Every call returns only once the underlying bus operation has completed.
/// A transaction is `begin`, any number of `send`, then `end`; the chip
/// select is held for its whole duration.
pub trait Transport {
    /// Select mode and assert chip select
    fn begin(&mut self, mode: Mode) -> DisplayResult<()>;

    /// Clock bytes out inside the open transaction
    fn send(&mut self, bytes: &[u8]) -> DisplayResult<()>;

    /// Wait for the last byte and deassert chip select
    fn end(&mut self) -> DisplayResult<()>;

    /// Busy-wait for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Drive a control line
    fn set_line(&mut self, line: ControlLine, asserted: bool) -> DisplayResult<()>;

    /// One command transaction
    fn command(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        self.begin(Mode::Command)?;
        self.send(bytes)?;
        self.end()
    }

    /// One data transaction
    fn data(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        self.begin(Mode::Data)?;
        self.send(bytes)?;
        self.end()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn begin(&mut self, mode: Mode) -> DisplayResult<()> {
        (**self).begin(mode)
    }

    fn send(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        (**self).send(bytes)
    }

    fn end(&mut self) -> DisplayResult<()> {
        (**self).end()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> DisplayResult<()> {
        (**self).set_line(line, asserted)
    }
}
