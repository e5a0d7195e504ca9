//! Bitbang SPI master over four GPIO lines
//!
//! [`BitbangSpi`] emulates an SPI mode 0 master (clock idle low, data valid
//! on the rising edge) by toggling MOSI, SCLK and CE0 and sampling MISO
//! through a [`GpioPort`]. There is no timing control: the bus runs as fast
//! as the port can toggle pins.
//!
//! The engine owns the lifecycle of its pins. They are exported and put in
//! their idle state exactly once, either explicitly with
//! [`BitbangSpi::open`] / [`BitbangSpi::ensure_ready`] or implicitly by the
//! first `select`, `deselect`, `transmit` or `receive`. They are unexported
//! again by [`BitbangSpi::close`] or when the engine is dropped.

use super::{byte_count, SpiTransport};
use crate::error::{Error, Result};
use crate::gpio::{GpioPort, PinMap, PinRole};

/// Order in which pins are unexported on release
const RELEASE_ORDER: [PinRole; 4] = [PinRole::Ce0, PinRole::Miso, PinRole::Mosi, PinRole::Sclk];

/// Level an output role is parked at after setup
const fn idle_level(role: PinRole) -> Option<bool> {
    match role {
        PinRole::Mosi | PinRole::Sclk => Some(false),
        PinRole::Ce0 => Some(true),
        PinRole::Miso => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Ready,
}

/// Software SPI master
pub struct BitbangSpi<G: GpioPort> {
    port: G,
    pins: PinMap,
    state: EngineState,
    /// Last level driven on MOSI, used to skip redundant writes
    mosi_high: bool,
}

impl<G: GpioPort> core::fmt::Debug for BitbangSpi<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitbangSpi")
            .field("pins", &self.pins)
            .field("state", &self.state)
            .field("mosi_high", &self.mosi_high)
            .finish_non_exhaustive()
    }
}

impl<G: GpioPort> BitbangSpi<G> {
    /// Create an engine without touching the pins yet
    pub fn new(port: G, pins: PinMap) -> Self {
        Self {
            port,
            pins,
            state: EngineState::Uninitialized,
            mosi_high: false,
        }
    }

    /// Create an engine and export and configure its pins immediately
    pub fn open(port: G, pins: PinMap) -> Result<Self> {
        let mut spi = Self::new(port, pins);
        spi.ensure_ready()?;
        Ok(spi)
    }

    /// Pin assignment used by this engine
    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// The underlying GPIO port
    pub fn port(&self) -> &G {
        &self.port
    }

    /// Whether the pins have been exported and configured
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    /// Export and configure the pins unless that already happened
    ///
    /// Setup order is MOSI (output, low), MISO (input), SCLK (output, low),
    /// CE0 (output, high). If a step fails, pins exported so far are
    /// unexported again and the engine stays uninitialized.
    pub fn ensure_ready(&mut self) -> Result<()> {
        if self.state == EngineState::Ready {
            return Ok(());
        }

        self.pins.validate()?;

        log::debug!(
            "bitbang_spi: setting up pins (mosi={}, miso={}, sclk={}, ce0={})",
            self.pins.mosi,
            self.pins.miso,
            self.pins.sclk,
            self.pins.ce0
        );

        for (i, role) in PinRole::ALL.into_iter().enumerate() {
            let pin = self.pins.pin(role);
            if let Err(e) = self.port.export(pin) {
                self.rollback(&PinRole::ALL[..i]);
                return Err(e);
            }
            if let Err(e) = self.configure(role) {
                self.rollback(&PinRole::ALL[..=i]);
                return Err(e);
            }
        }

        self.mosi_high = false;
        self.state = EngineState::Ready;
        Ok(())
    }

    fn configure(&mut self, role: PinRole) -> Result<()> {
        let pin = self.pins.pin(role);
        self.port.set_direction(pin, role.direction())?;
        if let Some(level) = idle_level(role) {
            self.port.set_value(pin, level)?;
        }
        Ok(())
    }

    fn rollback(&mut self, roles: &[PinRole]) {
        for &role in roles.iter().rev() {
            let pin = self.pins.pin(role);
            if let Err(e) = self.port.unexport(pin) {
                log::warn!(
                    "bitbang_spi: failed to unexport {} (GPIO {}) during rollback: {}",
                    role.name(),
                    pin,
                    e
                );
            }
        }
    }

    #[inline]
    fn drive(&mut self, role: PinRole, high: bool) -> Result<()> {
        self.port.set_value(self.pins.pin(role), high)
    }

    /// Drive chip select low, making the device active
    pub fn select(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.drive(PinRole::Ce0, false)
    }

    /// Drive chip select high, making the device inactive
    pub fn deselect(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.drive(PinRole::Ce0, true)
    }

    /// One clock cycle: SCLK high, then low
    pub fn pulse_clock(&mut self) -> Result<()> {
        if self.state != EngineState::Ready {
            return Err(Error::NotReady);
        }
        self.drive(PinRole::Sclk, true)?;
        self.drive(PinRole::Sclk, false)
    }

    /// Clock out bytes, most significant bit first
    ///
    /// MOSI is only written when the next bit differs from the level last
    /// driven, and is returned low after the final bit. Chip select is not
    /// touched.
    pub fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        log::trace!("bitbang_spi: transmit {:02X?}", data);

        for &byte in data {
            for i in (0..8).rev() {
                let bit = (byte >> i) & 1 != 0;
                if bit != self.mosi_high {
                    self.drive(PinRole::Mosi, bit)?;
                    self.mosi_high = bit;
                }
                self.pulse_clock()?;
            }
        }

        if self.mosi_high {
            self.drive(PinRole::Mosi, false)?;
            self.mosi_high = false;
        }
        Ok(())
    }

    /// Clock in `bits` bits into `buf`, most significant bit first
    ///
    /// Fills `ceil(bits / 8)` bytes and returns that count. Slots past
    /// `bits` in the last byte are padding: no clock is issued for them and
    /// they read as zero.
    pub fn receive_into(&mut self, bits: usize, buf: &mut [u8]) -> Result<usize> {
        if bits == 0 {
            return Err(Error::InvalidBitCount);
        }
        let len = byte_count(bits);
        if buf.len() < len {
            return Err(Error::BufferTooSmall);
        }
        self.ensure_ready()?;

        let miso = self.pins.miso;
        let mut current_bit = 0usize;
        for slot in buf[..len].iter_mut() {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte <<= 1;

                current_bit += 1;
                if current_bit > bits {
                    continue;
                }

                self.drive(PinRole::Sclk, true)?;
                let high = self.port.get_value(miso)?;
                self.drive(PinRole::Sclk, false)?;

                if high {
                    byte |= 1;
                }
            }
            *slot = byte;
        }

        log::trace!("bitbang_spi: received {} bits {:02X?}", bits, &buf[..len]);
        Ok(len)
    }

    /// Clock in `bits` bits and return them packed MSB first
    #[cfg(feature = "alloc")]
    pub fn receive(&mut self, bits: usize) -> Result<alloc::vec::Vec<u8>> {
        let mut buf = alloc::vec![0u8; byte_count(bits)];
        self.receive_into(bits, &mut buf)?;
        Ok(buf)
    }

    /// Unexport the pins if they were set up
    ///
    /// Every pin is attempted even if an earlier one fails; the first
    /// failure is returned.
    fn release(&mut self) -> Result<()> {
        if self.state != EngineState::Ready {
            return Ok(());
        }
        self.state = EngineState::Uninitialized;

        let mut result = Ok(());
        for role in RELEASE_ORDER {
            let pin = self.pins.pin(role);
            if let Err(e) = self.port.unexport(pin) {
                log::warn!(
                    "bitbang_spi: failed to unexport {} (GPIO {}): {}",
                    role.name(),
                    pin,
                    e
                );
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        log::debug!("bitbang_spi: pins released");
        result
    }

    /// Release the pins and report any failure
    ///
    /// Dropping the engine does the same but can only log errors.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }
}

impl<G: GpioPort> Drop for BitbangSpi<G> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("bitbang_spi: releasing pins failed: {}", e);
        }
    }
}

impl<G: GpioPort> SpiTransport for BitbangSpi<G> {
    fn select(&mut self) -> Result<()> {
        BitbangSpi::select(self)
    }

    fn deselect(&mut self) -> Result<()> {
        BitbangSpi::deselect(self)
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        BitbangSpi::transmit(self, data)
    }

    fn receive_into(&mut self, bits: usize, buf: &mut [u8]) -> Result<usize> {
        BitbangSpi::receive_into(self, bits, buf)
    }
}
