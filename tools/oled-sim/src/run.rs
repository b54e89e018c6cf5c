//! Demo runs and their traffic report

use log::{debug, info};
use thiserror::Error;

use ssd1331_display::display::ssd1331::cmd;
use ssd1331_display::display::framebuffer::PIXELS;
use ssd1331_display::{Display, DisplayError};

use crate::bus::PanelProbe;
use crate::demo::game::{Game, Palette};
use crate::demo::{Demo, Mode};

/// Command bytes a full-frame flush spends on the address window
const FULL_FRAME_COMMAND_BYTES: u64 = 6;
/// Data bytes a full-frame flush sends
const FULL_FRAME_DATA_BYTES: u64 = PIXELS as u64 * 2;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Bus fault: {0}")]
    Fault(DisplayError),

    #[error("Panel diverged from framebuffer at frame {frame}: {pixels} pixels differ")]
    Diverged { frame: u32, pixels: usize },
}

/// Run parameters
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: Mode,
    pub frames: u32,
    pub scroll_speed: i32,
    pub seed: u32,
    pub jump_period: u32,
    /// Compare the panel to the framebuffer after every frame, not just the last
    pub check_every_frame: bool,
}

/// What a run cost on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u32,
    /// Windows written
    pub transfers: usize,
    pub pixels: usize,
    pub data_bytes: u64,
    pub command_bytes: u64,
    pub copies: usize,
    pub fallbacks: usize,
    /// Rounds the runner completed
    pub rounds: u32,
}

impl RunReport {
    /// Bytes a full-frame flush of every frame would have sent
    pub fn full_frame_bytes(&self) -> u64 {
        self.frames as u64 * (FULL_FRAME_DATA_BYTES + FULL_FRAME_COMMAND_BYTES)
    }

    pub fn total_bytes(&self) -> u64 {
        self.data_bytes + self.command_bytes
    }

    pub fn bytes_saved(&self) -> i64 {
        self.full_frame_bytes() as i64 - self.total_bytes() as i64
    }

    /// Share of the full-frame traffic actually sent, in percent
    pub fn traffic_percent(&self) -> f64 {
        match self.full_frame_bytes() {
            0 => 0.0,
            full => self.total_bytes() as f64 * 100.0 / full as f64,
        }
    }
}

fn check_sync<T: PanelProbe>(display: &Display<T>, frame: u32) -> Result<(), RunError> {
    if let Some(fault) = display.transport().fault() {
        return Err(RunError::Fault(fault));
    }
    let pixels = display
        .framebuffer()
        .diff_count(display.transport().panel().gddram());
    if pixels != 0 {
        return Err(RunError::Diverged { frame, pixels });
    }
    Ok(())
}

/// Bring the panel up, then play `frames` frames of the demo
///
/// Traffic counters start after bring-up and the first full frame, so the
/// report covers only the per-frame updates.
pub fn run_demo<T: PanelProbe>(
    display: &mut Display<T>,
    palette: Palette,
    options: &RunOptions,
) -> Result<RunReport, RunError> {
    if !display.is_initialized() {
        display.initialize()?;
    }

    let mut demo = Demo::new(
        Game::new(options.scroll_speed, options.seed, options.jump_period),
        palette,
    );
    demo.present_first(display)?;
    check_sync(display, 0)?;

    let panel = display.transport_mut().panel_mut();
    panel.set_recording(false);
    panel.reset_counters();

    let mut report = RunReport::default();
    for frame in 1..=options.frames {
        let cost = demo.step(display, options.mode)?;
        report.frames = frame;
        report.transfers += cost.flush.transfers;
        report.pixels += cost.flush.pixels;
        report.copies += cost.copies;
        report.fallbacks += cost.fallbacks;

        if options.check_every_frame || frame == options.frames {
            check_sync(display, frame)?;
        }
        if frame % 100 == 0 {
            debug!(
                "{}: frame {} score {} speed {}",
                options.mode.name(),
                frame,
                demo.game.score,
                demo.game.scroll_speed()
            );
        }
    }

    let counters = display.transport().panel().counters();
    report.data_bytes = counters.data_bytes as u64;
    report.command_bytes = counters.command_bytes as u64;
    report.rounds = demo.game.rounds;

    info!(
        "{}: {} frames, {} windows, {} bytes ({:.1}% of full-frame)",
        options.mode.name(),
        report.frames,
        report.transfers,
        report.total_bytes(),
        report.traffic_percent()
    );
    Ok(report)
}

/// Opcode name for trace output
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        cmd::SET_COLUMN => "set column address",
        cmd::SET_ROW => "set row address",
        cmd::DRAW_LINE => "draw line",
        cmd::DRAW_RECT => "draw rectangle",
        cmd::COPY => "copy",
        cmd::DIM_WINDOW => "dim window",
        cmd::CLEAR_WINDOW => "clear window",
        cmd::FILL_ENABLE => "fill enable",
        cmd::SCROLL_SETUP => "scroll setup",
        cmd::SCROLL_DISABLE => "scroll stop",
        cmd::SCROLL_ENABLE => "scroll start",
        cmd::CONTRAST_A => "contrast A",
        cmd::CONTRAST_B => "contrast B",
        cmd::CONTRAST_C => "contrast C",
        cmd::MASTER_CURRENT => "master current",
        cmd::PRECHARGE_A => "second precharge A",
        cmd::PRECHARGE_B => "second precharge B",
        cmd::PRECHARGE_C => "second precharge C",
        cmd::REMAP => "remap / color depth",
        cmd::START_LINE => "display start line",
        cmd::DISPLAY_OFFSET => "display offset",
        cmd::NORMAL_DISPLAY => "normal display",
        cmd::ALL_ON => "entire display on",
        cmd::ALL_OFF => "entire display off",
        cmd::INVERT_DISPLAY => "inverse display",
        cmd::MULTIPLEX => "multiplex ratio",
        cmd::DIM_SETTINGS => "dim mode",
        cmd::DISPLAY_DIM => "display on (dim)",
        cmd::MASTER_CONFIG => "master configuration",
        cmd::DISPLAY_OFF => "display off",
        cmd::DISPLAY_ON => "display on",
        cmd::POWER_SAVE => "power save",
        cmd::PHASE_PERIOD => "phase period",
        cmd::CLOCK_DIV => "clock divider",
        cmd::GRAY_TABLE => "gray scale table",
        cmd::LINEAR_GRAY => "linear gray scale",
        cmd::PRECHARGE_LEVEL => "precharge level",
        cmd::NOP => "nop",
        cmd::VCOMH => "VCOMH",
        cmd::COMMAND_LOCK => "command lock",
        _ => "unknown",
    }
}
