//! GPIO access through the Linux character device (gpiocdev)
//!
//! There is no export step for the character device. A line is recorded on
//! export and requested from the chip the first time its direction is set;
//! later direction changes reconfigure the existing request. Unexporting
//! drops the request, which hands the line back to the kernel.

use std::collections::BTreeMap;

use gpiocdev::chip::Chip;
use gpiocdev::line::Value;
use gpiocdev::request::{Config, Request};

use touchpi_core::error::{GpioOp, Result as CoreResult};
use touchpi_core::gpio::{Direction, GpioPort, PinId, PinMap};

use crate::error::{LinuxGpioError, Result};
use crate::options::{apply_pin_option, check_pins};

/// Default GPIO chip device
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by tools such as `gpioinfo`
pub const CONSUMER: &str = "touchpi";

/// Configuration for the character device backend
#[derive(Debug, Clone)]
pub struct CdevConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Bus pins, as line offsets on the chip
    pub pins: PinMap,
}

impl Default for CdevConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_CHIP.to_string(),
            pins: PinMap::default(),
        }
    }
}

fn line_config(pin: PinId, direction: Direction, initial: Value) -> Config {
    let mut cfg = Config::default();
    match direction {
        Direction::In => {
            cfg.with_line(pin).as_input();
        }
        Direction::Out => {
            cfg.with_line(pin).as_output(initial);
        }
    }
    cfg
}

/// GPIO port on a character device chip
pub struct CdevGpio {
    device: String,
    pins: PinMap,
    /// Exported lines; `None` until a direction is configured
    lines: BTreeMap<PinId, Option<Request>>,
}

impl CdevGpio {
    /// Open the chip described by `config`
    pub fn open(config: &CdevConfig) -> Result<Self> {
        log::debug!("cdev: Opening device {}", config.device);

        Chip::from_path(&config.device).map_err(|source| LinuxGpioError::ChipOpenFailed {
            path: config.device.clone(),
            source,
        })?;

        log::info!("cdev: Opened {}", config.device);

        Ok(Self::new(config.device.clone(), config.pins))
    }

    fn new(device: String, pins: PinMap) -> Self {
        Self {
            device,
            pins,
            lines: BTreeMap::new(),
        }
    }

    /// Device path of the chip
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Level an output line starts at when requested
    ///
    /// Chip select starts high (inactive) so the device is never selected
    /// while the bus is being set up.
    fn initial_value(&self, pin: PinId) -> Value {
        if pin == self.pins.ce0 {
            Value::Active
        } else {
            Value::Inactive
        }
    }

    fn request(&self, pin: PinId) -> Result<&Request> {
        match self.lines.get(&pin) {
            Some(Some(request)) => Ok(request),
            Some(None) => Err(LinuxGpioError::LineNotRequested(pin)),
            None => Err(LinuxGpioError::LineNotExported(pin)),
        }
    }

    fn configure(&mut self, pin: PinId, direction: Direction) -> Result<()> {
        let cfg = line_config(pin, direction, self.initial_value(pin));
        let slot = self
            .lines
            .get_mut(&pin)
            .ok_or(LinuxGpioError::LineNotExported(pin))?;

        match slot {
            Some(request) => request
                .reconfigure(&cfg)
                .map_err(|source| LinuxGpioError::ReconfigureFailed { line: pin, source }),
            None => {
                let request = Request::from_config(cfg)
                    .on_chip(&self.device)
                    .with_consumer(CONSUMER)
                    .request()
                    .map_err(|source| LinuxGpioError::LineRequestFailed {
                        chip: self.device.clone(),
                        line: pin,
                        source,
                    })?;
                *slot = Some(request);
                Ok(())
            }
        }
    }

    fn level(&self, pin: PinId) -> Result<bool> {
        let value = self
            .request(pin)?
            .value(pin)
            .map_err(|source| LinuxGpioError::GetValueFailed { line: pin, source })?;
        Ok(value == Value::Active)
    }

    fn drive(&self, pin: PinId, high: bool) -> Result<()> {
        let value = if high { Value::Active } else { Value::Inactive };
        self.request(pin)?
            .set_value(pin, value)
            .map_err(|source| LinuxGpioError::SetValueFailed { line: pin, source })
    }
}

impl GpioPort for CdevGpio {
    fn export(&mut self, pin: PinId) -> CoreResult<()> {
        self.lines.entry(pin).or_insert(None);
        Ok(())
    }

    fn unexport(&mut self, pin: PinId) -> CoreResult<()> {
        match self.lines.remove(&pin) {
            Some(_) => {
                log::debug!("cdev: Released line {} on {}", pin, self.device);
                Ok(())
            }
            None => Err(LinuxGpioError::LineNotExported(pin).into_core(pin, GpioOp::Unexport)),
        }
    }

    fn set_direction(&mut self, pin: PinId, direction: Direction) -> CoreResult<()> {
        self.configure(pin, direction)
            .map_err(|e| e.into_core(pin, GpioOp::SetDirection))
    }

    fn set_value(&mut self, pin: PinId, high: bool) -> CoreResult<()> {
        self.drive(pin, high)
            .map_err(|e| e.into_core(pin, GpioOp::SetValue))
    }

    fn get_value(&mut self, pin: PinId) -> CoreResult<bool> {
        self.level(pin)
            .map_err(|e| e.into_core(pin, GpioOp::GetValue))
    }
}

/// Parse character device backend options
///
/// Supported options:
/// - `dev=/dev/gpiochip0` - GPIO chip device path
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `mosi=N`, `miso=N`, `sclk=N` (or `sck`), `ce0=N` (or `cs`) - line offsets
pub fn parse_options(options: &[(&str, &str)]) -> Result<CdevConfig> {
    let mut config = CdevConfig::default();
    let mut device: Option<String> = None;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        if apply_pin_option(&mut config.pins, key, value)? {
            continue;
        }
        match *key {
            "dev" => {
                device = Some(value.to_string());
            }
            "gpiochip" => {
                gpiochip = Some(value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid gpiochip value: {}", value))
                })?);
            }
            _ => {
                log::warn!("cdev: Unknown option: {}={}", key, value);
            }
        }
    }

    // dev takes precedence over gpiochip
    match (device, gpiochip) {
        (Some(dev), _) => config.device = dev,
        (None, Some(n)) => config.device = format!("/dev/gpiochip{}", n),
        (None, None) => {}
    }

    check_pins(&config.pins)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchpi_core::Error;

    fn unopened() -> CdevGpio {
        CdevGpio::new("/dev/null".to_string(), PinMap::default())
    }

    #[test]
    fn test_parse_options_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.device, DEFAULT_CHIP);
        assert_eq!(config.pins, PinMap::default());
    }

    #[test]
    fn test_parse_options_gpiochip() {
        let config = parse_options(&[("gpiochip", "4"), ("sck", "21")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip4");
        assert_eq!(config.pins.sclk, 21);
    }

    #[test]
    fn test_parse_options_dev_wins() {
        let config =
            parse_options(&[("gpiochip", "4"), ("dev", "/dev/gpiochip1")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(
            parse_options(&[("gpiochip", "zero")]),
            Err(LinuxGpioError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("ce0", "-1")]),
            Err(LinuxGpioError::InvalidLineNumber { name: "ce0", .. })
        ));
        assert!(parse_options(&[("cs", "9")]).is_err());
    }

    #[test]
    fn test_open_missing_chip() {
        let config = CdevConfig {
            device: "/nonexistent/gpiochip99".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            CdevGpio::open(&config),
            Err(LinuxGpioError::ChipOpenFailed { .. })
        ));
    }

    #[test]
    fn test_chip_select_requested_inactive() {
        let gpio = unopened();
        assert_eq!(gpio.initial_value(8), Value::Active);
        for pin in [10, 9, 11] {
            assert_eq!(gpio.initial_value(pin), Value::Inactive);
        }

        let gpio = CdevGpio::new("/dev/null".to_string(), PinMap::new(10, 9, 11, 7));
        assert_eq!(gpio.initial_value(7), Value::Active);
        assert_eq!(gpio.initial_value(8), Value::Inactive);
    }

    #[test]
    fn test_line_access_before_request() {
        let mut gpio = unopened();
        assert_eq!(
            gpio.set_value(10, true),
            Err(Error::gpio(10, GpioOp::SetValue))
        );
        gpio.export(10).unwrap();
        assert_eq!(gpio.get_value(10), Err(Error::gpio(10, GpioOp::GetValue)));
        gpio.unexport(10).unwrap();
        assert_eq!(gpio.unexport(10), Err(Error::gpio(10, GpioOp::Unexport)));
    }
}
