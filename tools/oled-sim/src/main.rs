//! SSD1331 OLED Simulator
//!
//! Host-side harness for the `ssd1331-display` rendering core. Runs the panel
//! bring-up and the runner demo against a simulated SSD1331, checks that the
//! panel memory always matches the framebuffer, and reports the SPI traffic
//! each update strategy costs.
//!
//! # Usage
//!
//! ```bash
//! # Show the bring-up command trace
//! oled-sim init
//!
//! # Compare all update strategies over 300 frames
//! oled-sim run
//!
//! # One strategy through the register-level SPI model, dump the last frame
//! oled-sim run --mode dirty --spi --dump frame.ppm
//!
//! # Write the default configuration
//! oled-sim config --output oled-sim.toml
//! ```

mod bus;
mod config;
mod demo;
mod ppm;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use ssd1331_display::hal::SpiMaster;
use ssd1331_display::sim::{Event, SimPanel};
use ssd1331_display::Display;

use bus::{PanelProbe, SimBus};
use config::SimConfig;
use demo::game::Palette;
use demo::Mode;
use run::{opcode_name, run_demo, RunOptions, RunReport};

/// SSD1331 OLED Simulator
///
/// Drive the rendering core against a simulated panel
#[derive(Parser)]
#[command(name = "oled-sim")]
#[command(version = "0.1.0")]
#[command(about = "Simulated SSD1331 panel for the OLED rendering core")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the panel up and print the command trace
    Init {
        /// Go through the register-level SPI controller model
        #[arg(long)]
        spi: bool,
    },

    /// Play the demo and report traffic
    Run {
        /// Frames to play (overrides config)
        #[arg(short, long)]
        frames: Option<u32>,

        /// Update strategy (default: all of them)
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Write the final panel memory of the last run as a PPM image
        #[arg(short, long)]
        dump: Option<PathBuf>,

        /// Go through the register-level SPI controller model
        #[arg(long)]
        spi: bool,

        /// Only compare panel and framebuffer after the last frame
        #[arg(long)]
        final_check: bool,
    },

    /// Print or write the effective configuration
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    match cli.command {
        Commands::Init { spi } => handle_init(&config, spi),
        Commands::Run {
            frames,
            mode,
            dump,
            spi,
            final_check,
        } => handle_run(&config, frames, mode, dump, spi, final_check),
        Commands::Config { output } => handle_config(&config, output),
    }
}

fn spi_panel(config: &SimConfig) -> Result<SpiMaster<SimBus>> {
    let mut spi = SpiMaster::new(SimBus::new(SimPanel::new()), config.panel.spi_config());
    spi.init()?;
    Ok(spi)
}

fn handle_init(config: &SimConfig, spi: bool) -> Result<()> {
    if spi {
        let mut display = Display::new(spi_panel(config)?);
        display.initialize()?;
        if let Some(fault) = display.transport().fault() {
            return Err(fault.into());
        }
        print_trace(display.transport().panel());
    } else {
        let mut display = Display::new(SimPanel::new());
        display.initialize()?;
        print_trace(display.transport());
    }
    Ok(())
}

fn print_trace(panel: &SimPanel) {
    println!("{}", "=".repeat(60));
    println!("{}", "SSD1331 Bring-up Trace".cyan().bold());
    println!("{}", "=".repeat(60));

    for event in panel.events() {
        match event {
            Event::Command(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                let name = bytes.first().map_or("empty", |&op| opcode_name(op));
                println!("  {} {:<24} {}", "CMD".green(), hex.join(" "), name.dimmed());
            }
            Event::Data(bytes) => {
                println!("  {} {} bytes", "DAT".yellow(), bytes.len());
            }
            Event::Line(line, level) => {
                let level = if *level { "high".white() } else { "low".dimmed() };
                println!("  {} {:?} {}", "PIN".cyan(), line, level);
            }
            Event::Delay(ms) => {
                println!("  {} {} ms", "DLY".blue(), ms);
            }
        }
    }

    let (vcc, pmod) = panel.power();
    println!("\n{}", "=".repeat(60));
    println!(
        "{} Display {}, Vcc {}, Pmod {}",
        "[OK]".green().bold(),
        on_off(panel.is_display_on()),
        on_off(vcc),
        on_off(pmod)
    );
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

fn run_one(
    config: &SimConfig,
    options: &RunOptions,
    spi: bool,
    dump: Option<&PathBuf>,
) -> Result<RunReport> {
    let palette = Palette {
        background: config.colors.background(),
        foreground: config.colors.foreground(),
        accent: config.colors.accent(),
    };

    if spi {
        let mut display = Display::new(spi_panel(config)?);
        let report = run_demo(&mut display, palette, options)?;
        finish(&display, dump)?;
        Ok(report)
    } else {
        let mut display = Display::new(SimPanel::new());
        let report = run_demo(&mut display, palette, options)?;
        finish(&display, dump)?;
        Ok(report)
    }
}

fn finish<T: PanelProbe>(display: &Display<T>, dump: Option<&PathBuf>) -> Result<()> {
    if let Some(path) = dump {
        ppm::save_ppm(path, display.transport().panel().gddram())?;
        println!("{} Wrote {}", "[OK]".green().bold(), path.display());
    }
    Ok(())
}

fn handle_run(
    config: &SimConfig,
    frames: Option<u32>,
    mode: Option<Mode>,
    dump: Option<PathBuf>,
    spi: bool,
    final_check: bool,
) -> Result<()> {
    let modes: Vec<Mode> = match mode {
        Some(mode) => vec![mode],
        None => Mode::ALL.to_vec(),
    };

    println!("{}", "=".repeat(60));
    println!("{}", "Demo Run".cyan().bold());
    println!("{}", "=".repeat(60));
    println!(
        "  Transport: {}",
        if spi { "SPI register model" } else { "direct" }
    );

    let mut failed = false;
    for mode in modes {
        let options = RunOptions {
            mode,
            frames: frames.unwrap_or(config.scene.frames),
            scroll_speed: config.scene.scroll_speed,
            seed: config.scene.seed,
            jump_period: config.scene.jump_period,
            check_every_frame: !final_check,
        };

        println!("\n{} {}", "[*]".cyan().bold(), mode.name().white().bold());
        match run_one(config, &options, spi, dump.as_ref()) {
            Ok(report) => print_report(&report),
            Err(e) => {
                println!("  {} {:#}", "[FAIL]".red().bold(), e);
                failed = true;
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    if failed {
        println!("{}", "One or more runs failed".red().bold());
        std::process::exit(1);
    }
    println!("{}", "Panel matched the framebuffer on every check".green());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("  Frames:          {}", report.frames);
    println!("  Windows written: {}", report.transfers);
    println!("  Pixels sent:     {}", report.pixels);
    println!("  Command bytes:   {}", report.command_bytes);
    println!("  Data bytes:      {}", report.data_bytes);
    if report.copies > 0 || report.fallbacks > 0 {
        println!("  Panel copies:    {}", report.copies);
        println!("  Full redraws:    {}", report.fallbacks);
    }
    println!("  Rounds played:   {}", report.rounds);

    let percent = format!("{:.1}%", report.traffic_percent());
    let percent = if report.bytes_saved() > 0 {
        percent.green()
    } else {
        percent.yellow()
    };
    println!(
        "  Traffic:         {} of full-frame ({} bytes saved)",
        percent,
        report.bytes_saved()
    );
}

fn handle_config(config: &SimConfig, output: Option<PathBuf>) -> Result<()> {
    let content = config.to_toml()?;
    if let Some(path) = output {
        std::fs::write(&path, &content)?;
        println!("{} Wrote {}", "[OK]".green().bold(), path.display());
    } else {
        print!("{}", content);
    }
    Ok(())
}
