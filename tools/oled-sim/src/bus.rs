//! Simulated SPI register block
//!
//! Implements [`RegisterBus`] for the SPI controller's register window and
//! turns register traffic into panel activity: CS# edges frame
//! transactions, D/C# picks their mode, TX writes clock bytes into the
//! [`SimPanel`], and RES#/VCCEN/PMODEN drive its control lines. Each TX byte
//! keeps BUSY set for a few status polls so wait loops are exercised.

use ssd1331_display::hal::gpio::Pin;
use ssd1331_display::hal::mmio::{spi_reg, RegisterBus};
use ssd1331_display::hal::spi::{ctrl_bits, status_bits};
use ssd1331_display::hal::{ControlLine, Mode, SpiMaster, Transport};
use ssd1331_display::sim::SimPanel;
use ssd1331_display::DisplayError;

/// Status polls BUSY stays set after each TX write
const BUSY_POLLS: u32 = 2;

/// Register-level model of the SPI controller wired to a panel
pub struct SimBus {
    panel: SimPanel,
    gpio: u32,
    ctrl: u32,
    clkdiv: u32,
    busy: u32,
    /// A transaction was opened on the panel at the last CS# fall
    framing: bool,
    /// Bus accesses seen
    pub accesses: u64,
    fault: Option<DisplayError>,
}

impl SimBus {
    /// Latch cleared at power-up, so RES# starts asserted
    pub fn new(panel: SimPanel) -> Self {
        let mut bus = Self {
            panel,
            gpio: 0,
            ctrl: 0,
            clkdiv: 0,
            busy: 0,
            framing: false,
            accesses: 0,
            fault: None,
        };
        bus.forward(|p| p.set_line(ControlLine::Reset, true));
        bus
    }

    pub fn panel(&self) -> &SimPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut SimPanel {
        &mut self.panel
    }

    /// Programmed clock divider
    pub fn clock_divider(&self) -> u32 {
        self.clkdiv
    }

    /// First error the panel reported, if any
    pub fn fault(&self) -> Option<DisplayError> {
        self.fault
    }

    fn forward(&mut self, op: impl FnOnce(&mut SimPanel) -> Result<(), DisplayError>) {
        if let Err(e) = op(&mut self.panel) {
            log::warn!("sim bus: panel rejected access: {}", e);
            self.fault.get_or_insert(e);
        }
    }

    fn latch(&mut self, value: u32) {
        let old = self.gpio;
        self.gpio = value;
        let changed = old ^ value;
        let high = |pin: Pin| value & pin.mask() != 0;

        if changed & Pin::ResN.mask() != 0 {
            let asserted = !high(Pin::ResN);
            self.forward(|p| p.set_line(ControlLine::Reset, asserted));
        }
        if changed & Pin::VccEn.mask() != 0 {
            let on = high(Pin::VccEn);
            self.forward(|p| p.set_line(ControlLine::VccEnable, on));
        }
        if changed & Pin::PmodEn.mask() != 0 {
            let on = high(Pin::PmodEn);
            self.forward(|p| p.set_line(ControlLine::PmodEnable, on));
        }
        let cs_low = !high(Pin::CsN);
        if changed & Pin::Dc.mask() != 0 && cs_low && old & Pin::CsN.mask() == 0 {
            self.fault
                .get_or_insert(DisplayError::Protocol("D/C# changed inside transaction"));
        }
        if changed & Pin::CsN.mask() != 0 {
            if cs_low {
                let mode = if high(Pin::Dc) { Mode::Data } else { Mode::Command };
                self.framing = false;
                self.forward(|p| p.begin(mode));
                self.framing = self.panel.is_framing();
            } else if self.framing {
                self.framing = false;
                self.forward(|p| p.end());
            }
        }
    }

    fn transmit(&mut self, byte: u8) {
        if self.ctrl & ctrl_bits::EN == 0 {
            self.fault
                .get_or_insert(DisplayError::Protocol("TX while controller disabled"));
            return;
        }
        if self.gpio & Pin::CsN.mask() != 0 {
            self.fault
                .get_or_insert(DisplayError::Protocol("TX with chip select high"));
            return;
        }
        self.busy = BUSY_POLLS;
        self.forward(|p| p.send(&[byte]));
    }

    fn status(&mut self) -> u32 {
        let mut status = 0;
        if self.ctrl & ctrl_bits::EN != 0 && self.busy == 0 {
            status |= status_bits::READY;
        }
        if self.busy > 0 {
            status |= status_bits::BUSY;
            self.busy -= 1;
        }
        if self.gpio & Pin::CsN.mask() == 0 {
            status |= status_bits::CS_ASSERTED;
        }
        status
    }
}

impl RegisterBus for SimBus {
    fn read32(&mut self, offset: usize) -> u32 {
        self.accesses += 1;
        match offset {
            spi_reg::STATUS => self.status(),
            spi_reg::GPIO => self.gpio,
            spi_reg::CTRL => self.ctrl,
            spi_reg::CLKDIV => self.clkdiv,
            // the panel never drives MISO
            spi_reg::RX => 0xFF,
            _ => 0,
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.accesses += 1;
        match offset {
            spi_reg::TX => self.transmit(value as u8),
            spi_reg::GPIO => self.latch(value),
            spi_reg::CTRL => self.ctrl = value,
            spi_reg::CLKDIV => self.clkdiv = value,
            _ => {}
        }
    }
}

/// Transports the tool can inspect after a run
pub trait PanelProbe: Transport {
    /// The simulated panel behind the transport
    fn panel(&self) -> &SimPanel;

    fn panel_mut(&mut self) -> &mut SimPanel;

    /// Error the wiring observed outside the transport's own results
    fn fault(&self) -> Option<DisplayError> {
        None
    }
}

impl PanelProbe for SimPanel {
    fn panel(&self) -> &SimPanel {
        self
    }

    fn panel_mut(&mut self) -> &mut SimPanel {
        self
    }
}

impl PanelProbe for SpiMaster<SimBus> {
    fn panel(&self) -> &SimPanel {
        self.bus().panel()
    }

    fn panel_mut(&mut self) -> &mut SimPanel {
        self.bus_mut().panel_mut()
    }

    fn fault(&self) -> Option<DisplayError> {
        self.bus().fault()
    }
}
