//! touchpi-core - Bit-banged SPI and the XPT2046 touch controller
//!
//! This crate drives an XPT2046 resistive touch screen controller over four
//! general purpose I/O lines when no SPI peripheral driver is available. It
//! is `no_std` compatible; the GPIO layer is supplied by the caller through
//! the [`gpio::GpioPort`] trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable allocating helpers such as `BitbangSpi::receive`
//!
//! # Example
//!
//! ```ignore
//! use touchpi_core::gpio::{GpioPort, PinMap};
//! use touchpi_core::spi::BitbangSpi;
//! use touchpi_core::xpt2046::Xpt2046;
//!
//! fn sample<G: GpioPort>(port: G) -> touchpi_core::Result<()> {
//!     let spi = BitbangSpi::open(port, PinMap::default())?;
//!     let mut touch = Xpt2046::new(spi);
//!     let x = touch.read_x()?;
//!     let pressure = touch.read_touch_pressure()?;
//!     if pressure.is_finite() {
//!         log::info!("touch at x={} pressure={:.2}", x, pressure);
//!     }
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod gpio;
pub mod spi;
pub mod xpt2046;

pub use error::{Error, GpioOp, Result};
