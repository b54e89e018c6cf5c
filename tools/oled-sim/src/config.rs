//! Simulator configuration (TOML)
//!
//! Every key is optional; missing keys take the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use ssd1331_display::hal::{SpiConfig, WaitPolicy};
use ssd1331_display::Rgb565;

/// Register-level SPI settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    /// Status polls before a wait times out (0 = spin forever)
    pub poll_budget: u32,
    /// Delay loop calibration
    pub cycles_per_ms: u32,
    /// SPI clock divider
    pub clock_divider: u32,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            poll_budget: 100_000,
            cycles_per_ms: 1_000,
            clock_divider: SpiConfig::OLED.clock_divider,
        }
    }
}

impl PanelSettings {
    /// SPI master configuration for these settings
    pub fn spi_config(&self) -> SpiConfig {
        let wait = match self.poll_budget {
            0 => WaitPolicy::Spin,
            max_polls => WaitPolicy::Bounded { max_polls },
        };
        SpiConfig {
            clock_divider: self.clock_divider,
            ..SpiConfig::OLED
        }
        .with_wait(wait)
        .with_cycles_per_ms(self.cycles_per_ms)
    }
}

/// Demo scene settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Frames per run
    pub frames: u32,
    /// Initial obstacle speed in pixels per frame
    pub scroll_speed: i32,
    /// Mixed into the obstacle generator
    pub seed: u32,
    /// Frames between scripted jumps
    pub jump_period: u32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            frames: 300,
            scroll_speed: 3,
            seed: 1,
            jump_period: 37,
        }
    }
}

/// Palette as RGB888 triples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub background: [u8; 3],
    pub foreground: [u8; 3],
    pub accent: [u8; 3],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            foreground: [235, 235, 235],
            accent: [255, 80, 80],
        }
    }
}

fn to_rgb565([r, g, b]: [u8; 3]) -> Rgb565 {
    Rgb565::from_rgb(r, g, b)
}

impl ColorSettings {
    pub fn background(&self) -> Rgb565 {
        to_rgb565(self.background)
    }

    pub fn foreground(&self) -> Rgb565 {
        to_rgb565(self.foreground)
    }

    pub fn accent(&self) -> Rgb565 {
        to_rgb565(self.accent)
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub panel: PanelSettings,
    pub scene: SceneSettings,
    pub colors: ColorSettings,
}

impl SimConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Parse TOML content
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
