//! CLI argument parsing

use crate::backends;
use clap::{Parser, Subcommand};
use touchpi_core::xpt2046::{Channel, Resolution};

/// Parse a conversion width (8 or 12)
fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let bits: u32 = s
        .parse()
        .map_err(|e| format!("Invalid number: {}", e))?;
    Resolution::from_bits(bits).ok_or_else(|| format!("Unsupported mode: {} (use 8 or 12)", bits))
}

/// Parse a channel name
fn parse_channel(s: &str) -> Result<Channel, String> {
    Channel::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = Channel::ALL.iter().map(|c| c.name()).collect();
        format!("Unknown channel: {} [available: {}]", s, names.join(", "))
    })
}

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "GPIO backend to use [available: {}]",
        backends::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "touchpi")]
#[command(author, version, about = "XPT2046 touch controller sampler over bit-banged SPI", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read every channel repeatedly and print the results
    Sample {
        /// Backend to use, with options (e.g. "sysfs" or "cdev:gpiochip=0,cs=8")
        #[arg(short, long, help = backend_help())]
        backend: String,

        /// Conversion mode in bits (8 or 12)
        #[arg(short, long, default_value = "12", value_parser = parse_resolution)]
        mode: Resolution,

        /// Number of samples to take (0 = until interrupted)
        #[arg(short, long, default_value_t = 0)]
        count: u64,

        /// Pause between samples in milliseconds
        #[arg(short, long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Take a single reading of one channel
    Read {
        /// Backend to use, with options
        #[arg(short, long, help = backend_help())]
        backend: String,

        /// Channel to read (x, y, z1, z2, temp0, temp1, vbat, aux)
        #[arg(long, value_parser = parse_channel)]
        channel: Channel,

        /// Conversion mode in bits (8 or 12)
        #[arg(short, long, default_value = "12", value_parser = parse_resolution)]
        mode: Resolution,
    },

    /// List available GPIO backends
    ListBackends,
}
