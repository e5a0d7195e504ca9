//! SPI master emulation
//!
//! This module provides the bitbang engine and the [`SpiTransport`] trait
//! that device drivers are written against.

mod bitbang;

pub use bitbang::BitbangSpi;

use crate::error::Result;

/// Number of bytes needed to hold `bits` bits
pub const fn byte_count(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Chip-select framed SPI transfers
///
/// A device transaction is `select`, any number of `transmit` and
/// `receive_into` calls, then `deselect`. Implementations assume exclusive
/// ownership of the bus for the duration of a transaction.
pub trait SpiTransport {
    /// Assert chip select (drive it low)
    fn select(&mut self) -> Result<()>;

    /// Release chip select (drive it high)
    fn deselect(&mut self) -> Result<()>;

    /// Clock out bytes, most significant bit first
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Clock in `bits` bits, MSB first, into `buf`
    ///
    /// Returns the number of bytes written (`ceil(bits / 8)`). Padding bits
    /// occupy the low-order end of the last byte and are always zero.
    fn receive_into(&mut self, bits: usize, buf: &mut [u8]) -> Result<usize>;
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn receive_into(&mut self, bits: usize, buf: &mut [u8]) -> Result<usize> {
        (**self).receive_into(bits, buf)
    }
}
