//! OLED control latch
//!
//! The SPI block exposes one output latch register (`SPI_GPIO`) carrying the
//! panel's side-band lines.
//!
//! # Pin Assignments
//!
//! | Bit | Pmod pin | Function          | Active |
//! |-----|----------|-------------------|--------|
//! | 0   | 1        | CS# (chip select) | low    |
//! | 1   | 7        | D/C# (1 = data)   | -      |
//! | 2   | 8        | RES# (reset)      | low    |
//! | 3   | 9        | VCCEN             | high   |
//! | 4   | 10       | PMODEN            | high   |
//!
//! The latch is a pure output register, so read-modify-write is safe. Every
//! update is followed by a readback barrier so the pin change is visible
//! before the next SPI clock edge.

use super::mmio::{spi_reg, RegisterBus};

/// Latch bits
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum Pin {
    /// Chip select, active low
    CsN = 1 << 0,
    /// Data/command select
    Dc = 1 << 1,
    /// Reset, active low
    ResN = 1 << 2,
    /// Panel Vcc enable
    VccEn = 1 << 3,
    /// Pmod supply enable
    PmodEn = 1 << 4,
}

impl Pin {
    /// Bit mask within the latch register
    #[inline]
    pub const fn mask(self) -> u32 {
        self as u32
    }
}

/// Borrowed view of the latch register
pub struct GpioLatch<'a, B: RegisterBus> {
    bus: &'a mut B,
}

impl<'a, B: RegisterBus> GpioLatch<'a, B> {
    /// Wrap the register bus of the SPI block
    pub fn new(bus: &'a mut B) -> Self {
        Self { bus }
    }

    /// Current latch value
    pub fn read(&mut self) -> u32 {
        self.bus.read32(spi_reg::GPIO)
    }

    /// Set and clear bits in one ordered read-modify-write
    pub fn update(&mut self, set: u32, clear: u32) {
        let value = (self.read() | set) & !clear;
        self.bus.write32_rb(spi_reg::GPIO, value);
    }

    /// Drive a pin high
    pub fn set_high(&mut self, pin: Pin) {
        self.update(pin.mask(), 0);
        self.bus.barrier();
    }

    /// Drive a pin low
    pub fn set_low(&mut self, pin: Pin) {
        self.update(0, pin.mask());
        self.bus.barrier();
    }

    /// Level currently latched for a pin
    pub fn is_high(&mut self, pin: Pin) -> bool {
        self.read() & pin.mask() != 0
    }
}

/// Display control helper functions
impl<'a, B: RegisterBus> GpioLatch<'a, B> {
    /// Set DC pin for command mode (low)
    #[inline]
    pub fn dc_command(&mut self) {
        self.set_low(Pin::Dc);
    }

    /// Set DC pin for data mode (high)
    #[inline]
    pub fn dc_data(&mut self) {
        self.set_high(Pin::Dc);
    }

    /// Assert reset (active low)
    #[inline]
    pub fn reset_assert(&mut self) {
        self.set_low(Pin::ResN);
    }

    /// Deassert reset
    #[inline]
    pub fn reset_deassert(&mut self) {
        self.set_high(Pin::ResN);
    }

    /// Drive CS# low
    #[inline]
    pub fn cs_low(&mut self) {
        self.set_low(Pin::CsN);
    }

    /// Drive CS# high
    #[inline]
    pub fn cs_high(&mut self) {
        self.set_high(Pin::CsN);
    }

    /// Switch the panel Vcc rail
    #[inline]
    pub fn vcc_enable(&mut self, on: bool) {
        if on {
            self.set_high(Pin::VccEn);
        } else {
            self.set_low(Pin::VccEn);
        }
    }

    /// Switch the Pmod 3.3V supply
    #[inline]
    pub fn pmod_enable(&mut self, on: bool) {
        if on {
            self.set_high(Pin::PmodEn);
        } else {
            self.set_low(Pin::PmodEn);
        }
    }
}
