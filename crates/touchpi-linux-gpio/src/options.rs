//! Option string handling shared by both backends

use touchpi_core::gpio::{PinId, PinMap, PinRole};

use crate::error::{LinuxGpioError, Result};

/// Apply a pin override, returning `false` if `key` is not a pin key
pub(crate) fn apply_pin_option(pins: &mut PinMap, key: &str, value: &str) -> Result<bool> {
    let Some(role) = PinRole::from_key(key) else {
        return Ok(false);
    };
    let pin: PinId = value
        .parse()
        .map_err(|_| LinuxGpioError::InvalidLineNumber {
            name: role.name(),
            value: value.to_string(),
        })?;
    pins.set(role, pin);
    Ok(true)
}

/// Reject pin maps that share a pin between roles
pub(crate) fn check_pins(pins: &PinMap) -> Result<()> {
    pins.validate()
        .map_err(|e| LinuxGpioError::InvalidParameter(e.to_string()))
}
