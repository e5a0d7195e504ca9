//! touchpi - XPT2046 touch controller sampler
//!
//! Talks to an XPT2046 resistive touch controller over SPI that is
//! bit-banged on four GPIO pins, by default the SPI0 pins of the Raspberry
//! Pi header, so no wiring changes are needed to move to a hardware SPI
//! driver later.
//!
//! # Architecture
//!
//! - `touchpi-core` holds the bitbang engine and the XPT2046 driver; both
//!   only see a `GpioPort`
//! - `touchpi-linux-gpio` provides sysfs and character device ports
//! - `touchpi-dummy` provides an emulated controller for testing

mod backends;
mod cli;
mod commands;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Installed before any backend exports pins, so an interrupt while
    // opening still ends with the pins released
    let running = Arc::new(AtomicBool::new(true));
    commands::install_stop_handler(running.clone())?;

    match cli.command {
        Commands::Sample {
            backend,
            mode,
            count,
            interval_ms,
        } => {
            let bus = backends::open_backend(&backend)?;
            commands::run_sample(
                bus,
                mode,
                count,
                Duration::from_millis(interval_ms),
                &running,
            )
        }
        Commands::Read {
            backend,
            channel,
            mode,
        } => {
            let bus = backends::open_backend(&backend)?;
            commands::run_read(bus, channel, mode, &running)
        }
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    }
}
