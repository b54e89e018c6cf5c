//! Register access for the SoC peripheral block
//!
//! # Memory Map
//!
//! | Peripheral | Base          |
//! |------------|---------------|
//! | SPI + OLED | `0x8000_0000` |
//! | UART       | `0x8000_1000` |
//!
//! The core has no fence instruction, so ordering between peripheral
//! accesses is enforced with readbacks: a write followed by a read of the
//! same (or any) device register cannot be reordered by the LSU.

/// SPI controller base address
pub const SPI_BASE: usize = 0x8000_0000;

/// UART base address (console, not used by the display)
pub const UART_BASE: usize = 0x8000_1000;

/// SPI register offsets
pub mod spi_reg {
    /// TX byte
    pub const TX: usize = 0x00;
    /// RX byte
    pub const RX: usize = 0x04;
    /// Status
    pub const STATUS: usize = 0x08;
    /// Control
    pub const CTRL: usize = 0x0C;
    /// Clock divider
    pub const CLKDIV: usize = 0x10;
    /// OLED control latch
    pub const GPIO: usize = 0x14;
}

/// 32-bit register window of one peripheral
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read32(&mut self, offset: usize) -> u32;

    /// Write the register at `offset`
    fn write32(&mut self, offset: usize, value: u32);

    /// Write, then read the same register back so the store is observed
    /// before anything that follows
    fn write32_rb(&mut self, offset: usize, value: u32) {
        self.write32(offset, value);
        let _ = self.read32(offset);
    }

    /// Benign STATUS read used as an I/O barrier
    fn barrier(&mut self) {
        let _ = self.read32(spi_reg::STATUS);
    }
}

/// Volatile MMIO register window
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a register window at `base`
    ///
    /// # Safety
    /// `base` must be the mapped address of a peripheral register block at
    /// least `0x18` bytes long, and no other code may access it
    /// concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of this window
    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read32(&mut self, offset: usize) -> u32 {
        // SAFETY: `new` requires `base` to map a register block covering `offset`.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}
