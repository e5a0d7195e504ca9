//! touchpi-linux-gpio - Linux GPIO backends for the bitbang engine
//!
//! This crate provides two [`GpioPort`] implementations for Linux:
//!
//! - [`SysfsGpio`] drives pins through the legacy `/sys/class/gpio`
//!   interface (export, direction and value attributes).
//! - [`CdevGpio`] drives pins through the GPIO character device using the
//!   gpiocdev crate, which is the modern replacement for sysfs.
//!
//! # Usage with touchpi CLI
//!
//! ```bash
//! # Raspberry Pi SPI0 pins through sysfs
//! touchpi sample -b sysfs
//!
//! # Character device on another chip, chip select on GPIO 7
//! touchpi sample -b cdev:gpiochip=1,cs=7
//! ```
//!
//! # GPIO Pin Wiring
//!
//! Defaults follow the SPI0 pins of the Raspberry Pi header:
//!
//! | XPT2046 Pin | Role          | BCM GPIO |
//! |-------------|---------------|----------|
//! | DIN         | MOSI (output) | 10       |
//! | DOUT        | MISO (input)  | 9        |
//! | DCLK        | SCLK (output) | 11       |
//! | CS          | CE0 (output)  | 8        |
//!
//! # System Requirements
//!
//! - sysfs: kernel built with `CONFIG_GPIO_SYSFS` and write access to
//!   `/sys/class/gpio`
//! - cdev: access to `/dev/gpiochipN` (may require root or udev rules)

pub mod cdev;
pub mod error;
mod options;
pub mod sysfs;

// Re-exports
pub use cdev::{CdevConfig, CdevGpio};
pub use error::{LinuxGpioError, Result};
pub use sysfs::{SysfsConfig, SysfsGpio};

use touchpi_core::gpio::GpioPort;
use touchpi_core::spi::BitbangSpi;

/// Engine over a boxed backend, as handed to the CLI
pub type BoxedSpi = BitbangSpi<Box<dyn GpioPort>>;

/// Open the sysfs backend and set up the bus pins
///
/// # Example Options
///
/// - `base=/sys/class/gpio` - sysfs GPIO directory
/// - `settle_ms=100` - pause after exporting a pin
/// - `mosi=10`, `miso=9`, `sclk=11`, `ce0=8` - pin overrides
pub fn open_sysfs_spi(
    options: &[(&str, &str)],
) -> std::result::Result<BoxedSpi, Box<dyn std::error::Error>> {
    let config = sysfs::parse_options(options)?;
    let port: Box<dyn GpioPort> = Box::new(SysfsGpio::open(&config)?);
    Ok(BitbangSpi::open(port, config.pins)?)
}

/// Open the character device backend and set up the bus pins
///
/// # Example Options
///
/// - `dev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `gpiochip=0` - GPIO chip number
/// - `mosi=10`, `miso=9`, `sclk=11`, `ce0=8` - line offset overrides
pub fn open_cdev_spi(
    options: &[(&str, &str)],
) -> std::result::Result<BoxedSpi, Box<dyn std::error::Error>> {
    let config = cdev::parse_options(options)?;
    let port: Box<dyn GpioPort> = Box::new(CdevGpio::open(&config)?);
    Ok(BitbangSpi::open(port, config.pins)?)
}
