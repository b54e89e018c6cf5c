//! SPI master for the OLED port
//!
//! Byte-at-a-time master on the SoC SPI block, with CS# and D/C# driven from
//! the control latch rather than by the controller.
//!
//! # Transfer Ordering
//!
//! Each byte is: wait READY, write TX, barrier, wait BUSY clear, read RX,
//! barrier. Reading RX even though the display never answers anchors the
//! completion of the byte before the next access. D/C# is settled before CS#
//! falls, and CS# only rises once BUSY has been observed clear.
//!
//! # Waiting
//!
//! Status polling follows a [`WaitPolicy`]. Hardware builds may spin forever
//! (`spin-wait` feature); host and simulator builds give up after a poll
//! budget with [`DisplayError::Timeout`].

use log::trace;

use super::gpio::GpioLatch;
use super::mmio::{spi_reg, RegisterBus};
use super::{ControlLine, Mode, Transport};
use crate::error::{DisplayError, DisplayResult, WaitCondition};

/// STATUS register bits
pub mod status_bits {
    /// Controller can accept a TX byte
    pub const READY: u32 = 1 << 0;
    /// A byte is being clocked out
    pub const BUSY: u32 = 1 << 1;
    /// CS# currently low
    pub const CS_ASSERTED: u32 = 1 << 8;
}

/// CTRL register bits
pub mod ctrl_bits {
    /// Sample on the positive edge
    pub const POS_EDGE: u32 = 1 << 0;
    /// 8-bit frames
    pub const WIDTH8: u32 = 1 << 1;
    /// Clock phase
    pub const CLK_PHASE: u32 = 1 << 2;
    /// Controller enable
    pub const EN: u32 = 1 << 8;
}

/// Polls before a bounded wait reports a timeout
pub const DEFAULT_POLL_BUDGET: u32 = 100_000;

/// How long status polling may run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Poll until the condition holds, however long that takes
    Spin,
    /// Give up after `max_polls` status reads
    Bounded { max_polls: u32 },
}

impl WaitPolicy {
    /// Build default: spin with the `spin-wait` feature, bounded otherwise
    pub const DEFAULT: Self = if cfg!(feature = "spin-wait") {
        WaitPolicy::Spin
    } else {
        WaitPolicy::Bounded { max_polls: DEFAULT_POLL_BUDGET }
    };
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// SPI configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpiConfig {
    /// Clock divider (core clock / divider = SCLK)
    pub clock_divider: u32,
    /// CTRL register value
    pub ctrl: u32,
    /// Status polling policy
    pub wait: WaitPolicy,
    /// Spin iterations per millisecond for `delay_ms`
    pub cycles_per_ms: u32,
}

impl SpiConfig {
    /// OLED settings: mode with positive-edge sampling, 8-bit frames,
    /// 25 MHz core clock / 50
    pub const OLED: Self = Self {
        clock_divider: 50,
        ctrl: ctrl_bits::EN | ctrl_bits::WIDTH8 | ctrl_bits::POS_EDGE | ctrl_bits::CLK_PHASE,
        wait: WaitPolicy::DEFAULT,
        cycles_per_ms: 50_000,
    };

    /// Set the polling policy
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Set the delay calibration
    pub fn with_cycles_per_ms(mut self, cycles_per_ms: u32) -> Self {
        self.cycles_per_ms = cycles_per_ms;
        self
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::OLED
    }
}

/// SPI master driver state
pub struct SpiMaster<B: RegisterBus> {
    bus: B,
    config: SpiConfig,
    open: Option<Mode>,
}

impl<B: RegisterBus> SpiMaster<B> {
    /// Create a new SPI master over a register bus
    pub fn new(bus: B, config: SpiConfig) -> Self {
        Self { bus, config, open: None }
    }

    /// Active configuration
    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Program clock divider and control, then park CS# high
    pub fn init(&mut self) -> DisplayResult<()> {
        self.bus.write32_rb(spi_reg::CLKDIV, self.config.clock_divider);
        self.bus.write32_rb(spi_reg::CTRL, self.config.ctrl);
        self.bus.barrier();
        self.cs_deassert()
    }

    /// Give the register bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Borrow the register bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the register bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn gpio(&mut self) -> GpioLatch<'_, B> {
        GpioLatch::new(&mut self.bus)
    }

    fn wait_until(&mut self, condition: WaitCondition) -> DisplayResult<()> {
        let mut polls: u32 = 0;
        loop {
            let status = self.bus.read32(spi_reg::STATUS);
            let satisfied = match condition {
                WaitCondition::TxReady => status & status_bits::READY != 0,
                WaitCondition::Idle => status & status_bits::BUSY == 0,
            };
            if satisfied {
                return Ok(());
            }
            if let WaitPolicy::Bounded { max_polls } = self.config.wait {
                polls += 1;
                if polls >= max_polls {
                    return Err(DisplayError::Timeout(condition));
                }
            }
            core::hint::spin_loop();
        }
    }

    /// Transfer one byte, returning what was shifted in
    pub fn xfer(&mut self, tx: u8) -> DisplayResult<u8> {
        self.wait_until(WaitCondition::TxReady)?;

        self.bus.write32(spi_reg::TX, tx as u32);
        self.bus.barrier();

        self.wait_until(WaitCondition::Idle)?;

        let rx = self.bus.read32(spi_reg::RX) as u8;
        self.bus.barrier();
        Ok(rx)
    }

    fn cs_assert(&mut self) {
        self.gpio().cs_low();
        self.bus.barrier();
    }

    fn cs_deassert(&mut self) -> DisplayResult<()> {
        self.wait_until(WaitCondition::Idle)?;
        self.bus.barrier();
        self.gpio().cs_high();
        self.bus.barrier();
        Ok(())
    }
}

impl<B: RegisterBus> Transport for SpiMaster<B> {
    fn begin(&mut self, mode: Mode) -> DisplayResult<()> {
        if self.open.is_some() {
            return Err(DisplayError::Protocol("nested transaction"));
        }
        // D/C# must be stable before CS# and the first clock edge
        match mode {
            Mode::Command => self.gpio().dc_command(),
            Mode::Data => self.gpio().dc_data(),
        }
        self.cs_assert();
        self.open = Some(mode);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        if self.open.is_none() {
            return Err(DisplayError::Protocol("send outside transaction"));
        }
        for &byte in bytes {
            self.xfer(byte)?;
        }
        Ok(())
    }

    fn end(&mut self) -> DisplayResult<()> {
        let mode = self.open.ok_or(DisplayError::Protocol("end without begin"))?;
        // stays open until CS# is really high
        self.cs_deassert()?;
        self.open = None;
        trace!("spi: end {:?} transaction", mode);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            for _ in 0..self.config.cycles_per_ms {
                core::hint::spin_loop();
            }
        }
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> DisplayResult<()> {
        let mut gpio = self.gpio();
        match line {
            ControlLine::Reset if asserted => gpio.reset_assert(),
            ControlLine::Reset => gpio.reset_deassert(),
            ControlLine::VccEnable => gpio.vcc_enable(asserted),
            ControlLine::PmodEnable => gpio.pmod_enable(asserted),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::gpio::Pin;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Read(usize),
        Write(usize, u32),
    }

    /// Register block that completes every byte immediately
    struct FakeBus {
        log: Vec<Access>,
        gpio: u32,
        status: u32,
        tx: Vec<u8>,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                log: Vec::new(),
                gpio: Pin::CsN.mask() | Pin::ResN.mask(),
                status: status_bits::READY,
                tx: Vec::new(),
            }
        }

        fn writes(&self) -> Vec<(usize, u32)> {
            self.log
                .iter()
                .filter_map(|a| match *a {
                    Access::Write(off, v) => Some((off, v)),
                    Access::Read(_) => None,
                })
                .collect()
        }
    }

    impl RegisterBus for FakeBus {
        fn read32(&mut self, offset: usize) -> u32 {
            self.log.push(Access::Read(offset));
            match offset {
                spi_reg::GPIO => self.gpio,
                spi_reg::STATUS => self.status,
                _ => 0,
            }
        }

        fn write32(&mut self, offset: usize, value: u32) {
            self.log.push(Access::Write(offset, value));
            match offset {
                spi_reg::GPIO => self.gpio = value,
                spi_reg::TX => self.tx.push(value as u8),
                _ => {}
            }
        }
    }

    fn master() -> SpiMaster<FakeBus> {
        SpiMaster::new(
            FakeBus::new(),
            SpiConfig::OLED.with_wait(WaitPolicy::Bounded { max_polls: 8 }),
        )
    }

    #[test]
    fn test_init_programs_clock_then_control() {
        let mut spi = master();
        spi.init().unwrap();
        let writes = spi.bus_mut().writes();
        assert_eq!(writes[0], (spi_reg::CLKDIV, 50));
        assert_eq!(writes[1], (spi_reg::CTRL, SpiConfig::OLED.ctrl));
        // CLKDIV is read back before CTRL is touched
        assert_eq!(spi.bus_mut().log[1], Access::Read(spi_reg::CLKDIV));
        assert!(spi.bus_mut().gpio & Pin::CsN.mask() != 0);
    }

    #[test]
    fn test_command_transaction_framing() {
        let mut spi = master();
        spi.command(&[0xFD, 0x12]).unwrap();

        let bus = spi.release();
        assert_eq!(bus.tx, vec![0xFD, 0x12]);

        let gpio_writes: Vec<u32> = bus
            .writes()
            .into_iter()
            .filter(|(off, _)| *off == spi_reg::GPIO)
            .map(|(_, v)| v)
            .collect();
        // DC low first, then CS low, then CS high at the end
        assert_eq!(gpio_writes[0] & Pin::Dc.mask(), 0);
        assert!(gpio_writes[0] & Pin::CsN.mask() != 0);
        assert_eq!(gpio_writes[1] & Pin::CsN.mask(), 0);
        assert!(gpio_writes.last().unwrap() & Pin::CsN.mask() != 0);
    }

    #[test]
    fn test_data_transaction_sets_dc_high() {
        let mut spi = master();
        spi.data(&[0xAB]).unwrap();
        assert!(spi.bus_mut().gpio & Pin::Dc.mask() != 0);
    }

    #[test]
    fn test_every_tx_write_is_followed_by_barrier() {
        let mut spi = master();
        spi.command(&[0x01, 0x02, 0x03]).unwrap();
        let log = &spi.bus_mut().log;
        for (i, access) in log.iter().enumerate() {
            if let Access::Write(spi_reg::TX, _) = access {
                assert_eq!(log[i + 1], Access::Read(spi_reg::STATUS));
            }
        }
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let mut spi = master();
        spi.bus_mut().status = status_bits::BUSY;
        spi.begin(Mode::Command).unwrap();
        assert_eq!(
            spi.send(&[0xAE]),
            Err(DisplayError::Timeout(WaitCondition::TxReady))
        );

        spi.bus_mut().status = status_bits::READY | status_bits::BUSY;
        assert_eq!(spi.xfer(0xAE), Err(DisplayError::Timeout(WaitCondition::Idle)));
    }

    #[test]
    fn test_end_timeout_keeps_transaction_open() {
        let mut spi = master();
        spi.begin(Mode::Command).unwrap();
        spi.bus_mut().status = status_bits::READY | status_bits::BUSY;
        assert_eq!(spi.end(), Err(DisplayError::Timeout(WaitCondition::Idle)));
        assert_eq!(spi.bus_mut().gpio & Pin::CsN.mask(), 0);
        assert_eq!(
            spi.begin(Mode::Data),
            Err(DisplayError::Protocol("nested transaction"))
        );

        spi.bus_mut().status = status_bits::READY;
        spi.end().unwrap();
        assert!(spi.bus_mut().gpio & Pin::CsN.mask() != 0);
        spi.begin(Mode::Data).unwrap();
    }

    #[test]
    fn test_framing_errors() {
        let mut spi = master();
        assert_eq!(
            spi.send(&[0x00]),
            Err(DisplayError::Protocol("send outside transaction"))
        );
        assert!(spi.end().is_err());
        spi.begin(Mode::Data).unwrap();
        assert_eq!(
            spi.begin(Mode::Command),
            Err(DisplayError::Protocol("nested transaction"))
        );
    }

    #[test]
    fn test_control_lines() {
        let mut spi = master();
        spi.set_line(ControlLine::Reset, true).unwrap();
        assert_eq!(spi.bus_mut().gpio & Pin::ResN.mask(), 0);
        spi.set_line(ControlLine::Reset, false).unwrap();
        assert!(spi.bus_mut().gpio & Pin::ResN.mask() != 0);

        spi.set_line(ControlLine::VccEnable, true).unwrap();
        spi.set_line(ControlLine::PmodEnable, true).unwrap();
        let gpio = spi.bus_mut().gpio;
        assert!(gpio & Pin::VccEn.mask() != 0);
        assert!(gpio & Pin::PmodEn.mask() != 0);
    }
}
