//! GPIO capability interface and pin configuration
//!
//! The bitbang engine never touches hardware directly. It consumes a
//! [`GpioPort`], which any backend (Linux sysfs, the GPIO character device,
//! an emulator) can implement with five primitive operations.

use crate::error::{Error, Result};

/// Physical pin identifier as understood by the GPIO backend
pub type PinId = u32;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Input (sampled by the host)
    In,
    /// Output (driven by the host)
    Out,
}

/// Access to single GPIO lines
///
/// Every call blocks until the underlying layer returns. Failures are
/// reported as [`Error::Gpio`]; callers treat them as fatal.
pub trait GpioPort {
    /// Make a pin available for use
    fn export(&mut self, pin: PinId) -> Result<()>;

    /// Release a pin previously exported
    fn unexport(&mut self, pin: PinId) -> Result<()>;

    /// Configure a pin as input or output
    fn set_direction(&mut self, pin: PinId, direction: Direction) -> Result<()>;

    /// Drive an output pin high (`true`) or low (`false`)
    fn set_value(&mut self, pin: PinId, high: bool) -> Result<()>;

    /// Sample the level of a pin
    fn get_value(&mut self, pin: PinId) -> Result<bool>;
}

impl<T: GpioPort + ?Sized> GpioPort for &mut T {
    fn export(&mut self, pin: PinId) -> Result<()> {
        (**self).export(pin)
    }

    fn unexport(&mut self, pin: PinId) -> Result<()> {
        (**self).unexport(pin)
    }

    fn set_direction(&mut self, pin: PinId, direction: Direction) -> Result<()> {
        (**self).set_direction(pin, direction)
    }

    fn set_value(&mut self, pin: PinId, high: bool) -> Result<()> {
        (**self).set_value(pin, high)
    }

    fn get_value(&mut self, pin: PinId) -> Result<bool> {
        (**self).get_value(pin)
    }
}

#[cfg(feature = "alloc")]
impl<T: GpioPort + ?Sized> GpioPort for alloc::boxed::Box<T> {
    fn export(&mut self, pin: PinId) -> Result<()> {
        (**self).export(pin)
    }

    fn unexport(&mut self, pin: PinId) -> Result<()> {
        (**self).unexport(pin)
    }

    fn set_direction(&mut self, pin: PinId, direction: Direction) -> Result<()> {
        (**self).set_direction(pin, direction)
    }

    fn set_value(&mut self, pin: PinId, high: bool) -> Result<()> {
        (**self).set_value(pin, high)
    }

    fn get_value(&mut self, pin: PinId) -> Result<bool> {
        (**self).get_value(pin)
    }
}

/// Role a pin plays on the SPI bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRole {
    /// Master Out Slave In
    Mosi,
    /// Master In Slave Out
    Miso,
    /// Serial clock
    Sclk,
    /// Chip enable 0 (active low)
    Ce0,
}

impl PinRole {
    /// All roles, in the order the engine sets them up
    pub const ALL: [PinRole; 4] = [Self::Mosi, Self::Miso, Self::Sclk, Self::Ce0];

    /// Direction the host configures for this role
    pub const fn direction(self) -> Direction {
        match self {
            Self::Miso => Direction::In,
            Self::Mosi | Self::Sclk | Self::Ce0 => Direction::Out,
        }
    }

    /// Short lowercase name, as used in option strings
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mosi => "mosi",
            Self::Miso => "miso",
            Self::Sclk => "sclk",
            Self::Ce0 => "ce0",
        }
    }

    /// Role named by an option key, accepting `sck` and `cs` as aliases
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "mosi" => Some(Self::Mosi),
            "miso" => Some(Self::Miso),
            "sclk" | "sck" => Some(Self::Sclk),
            "ce0" | "cs" => Some(Self::Ce0),
            _ => None,
        }
    }
}

/// BCM GPIO numbers of the SPI0 pins on the Raspberry Pi expansion header
pub mod rpi {
    use super::PinId;

    /// Header pin 19
    pub const MOSI: PinId = 10;
    /// Header pin 21
    pub const MISO: PinId = 9;
    /// Header pin 23
    pub const SCLK: PinId = 11;
    /// Header pin 24
    pub const CE0: PinId = 8;
}

/// Mapping from bus roles to physical pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// MOSI pin
    pub mosi: PinId,
    /// MISO pin
    pub miso: PinId,
    /// SCLK pin
    pub sclk: PinId,
    /// Chip-select pin
    pub ce0: PinId,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            mosi: rpi::MOSI,
            miso: rpi::MISO,
            sclk: rpi::SCLK,
            ce0: rpi::CE0,
        }
    }
}

impl PinMap {
    /// Create a pin map from explicit pin numbers
    pub const fn new(mosi: PinId, miso: PinId, sclk: PinId, ce0: PinId) -> Self {
        Self {
            mosi,
            miso,
            sclk,
            ce0,
        }
    }

    /// Pin assigned to a role
    pub const fn pin(&self, role: PinRole) -> PinId {
        match role {
            PinRole::Mosi => self.mosi,
            PinRole::Miso => self.miso,
            PinRole::Sclk => self.sclk,
            PinRole::Ce0 => self.ce0,
        }
    }

    /// Assign a pin to a role
    pub fn set(&mut self, role: PinRole, pin: PinId) {
        let slot = match role {
            PinRole::Mosi => &mut self.mosi,
            PinRole::Miso => &mut self.miso,
            PinRole::Sclk => &mut self.sclk,
            PinRole::Ce0 => &mut self.ce0,
        };
        *slot = pin;
    }

    /// Role of a pin, if it belongs to this map
    pub fn role_of(&self, pin: PinId) -> Option<PinRole> {
        PinRole::ALL.into_iter().find(|&role| self.pin(role) == pin)
    }

    /// Reject maps that assign one pin to two roles
    pub fn validate(&self) -> Result<()> {
        let pins = PinRole::ALL.map(|role| self.pin(role));
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(Error::PinConflict(*pin));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map_is_rpi_spi0() {
        let pins = PinMap::default();
        assert_eq!(pins.pin(PinRole::Mosi), 10);
        assert_eq!(pins.pin(PinRole::Miso), 9);
        assert_eq!(pins.pin(PinRole::Sclk), 11);
        assert_eq!(pins.pin(PinRole::Ce0), 8);
        assert!(pins.validate().is_ok());
    }

    #[test]
    fn test_option_keys() {
        assert_eq!(PinRole::from_key("sck"), Some(PinRole::Sclk));
        assert_eq!(PinRole::from_key("cs"), Some(PinRole::Ce0));
        assert_eq!(PinRole::from_key("ce1"), None);
        for role in PinRole::ALL {
            assert_eq!(PinRole::from_key(role.name()), Some(role));
        }

        let mut pins = PinMap::default();
        pins.set(PinRole::Ce0, 7);
        assert_eq!(pins.ce0, 7);
        assert_eq!(pins.role_of(7), Some(PinRole::Ce0));
    }

    #[test]
    fn test_role_directions() {
        assert_eq!(PinRole::Miso.direction(), Direction::In);
        assert_eq!(PinRole::Mosi.direction(), Direction::Out);
        assert_eq!(PinRole::Sclk.direction(), Direction::Out);
        assert_eq!(PinRole::Ce0.direction(), Direction::Out);
    }

    #[test]
    fn test_validate_rejects_shared_pin() {
        let pins = PinMap::new(10, 9, 10, 8);
        assert_eq!(pins.validate(), Err(Error::PinConflict(10)));
    }

    #[test]
    fn test_role_of() {
        let pins = PinMap::new(1, 2, 3, 4);
        assert_eq!(pins.role_of(3), Some(PinRole::Sclk));
        assert_eq!(pins.role_of(5), None);
    }
}
