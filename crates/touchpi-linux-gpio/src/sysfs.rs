//! GPIO access through the legacy sysfs interface
//!
//! Each pin lives under `<base>/gpioN` once its number has been written to
//! `<base>/export`. Direction and level are plain text attributes:
//! `in`/`out` in `direction`, `0`/`1` in `value`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use touchpi_core::error::{GpioOp, Result as CoreResult};
use touchpi_core::gpio::{Direction, GpioPort, PinId, PinMap};

use crate::error::{LinuxGpioError, Result};
use crate::options::{apply_pin_option, check_pins};

/// Default sysfs GPIO directory
pub const DEFAULT_BASE: &str = "/sys/class/gpio";

/// Default time given to udev to create `gpioN` after an export
const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Configuration for the sysfs backend
#[derive(Debug, Clone)]
pub struct SysfsConfig {
    /// sysfs GPIO directory
    pub base: PathBuf,
    /// Bus pins
    pub pins: PinMap,
    /// Pause after writing to `export`
    pub settle: Duration,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            base: PathBuf::from(DEFAULT_BASE),
            pins: PinMap::default(),
            settle: DEFAULT_SETTLE,
        }
    }
}

/// sysfs GPIO port
#[derive(Debug)]
pub struct SysfsGpio {
    base: PathBuf,
    settle: Duration,
}

impl SysfsGpio {
    /// Open the sysfs GPIO directory described by `config`
    pub fn open(config: &SysfsConfig) -> Result<Self> {
        let export = config.base.join("export");
        fs::metadata(&export).map_err(|source| LinuxGpioError::Sysfs {
            path: export,
            source,
        })?;

        log::info!("sysfs: using {}", config.base.display());

        Ok(Self {
            base: config.base.clone(),
            settle: config.settle,
        })
    }

    /// sysfs GPIO directory in use
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn pin_dir(&self, pin: PinId) -> PathBuf {
        self.base.join(format!("gpio{}", pin))
    }

    fn write_attr(path: PathBuf, contents: &str) -> Result<()> {
        fs::write(&path, contents).map_err(|source| LinuxGpioError::Sysfs { path, source })
    }

    fn read_level(&self, pin: PinId) -> Result<bool> {
        let path = self.pin_dir(pin).join("value");
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) => return Err(LinuxGpioError::Sysfs { path, source }),
        };
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(LinuxGpioError::InvalidValue {
                value: other.to_string(),
                path,
            }),
        }
    }
}

impl GpioPort for SysfsGpio {
    fn export(&mut self, pin: PinId) -> CoreResult<()> {
        if self.pin_dir(pin).exists() {
            log::debug!("sysfs: GPIO {} already exported", pin);
            return Ok(());
        }
        Self::write_attr(self.base.join("export"), &pin.to_string())
            .map_err(|e| e.into_core(pin, GpioOp::Export))?;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(())
    }

    fn unexport(&mut self, pin: PinId) -> CoreResult<()> {
        Self::write_attr(self.base.join("unexport"), &pin.to_string())
            .map_err(|e| e.into_core(pin, GpioOp::Unexport))?;
        log::debug!("sysfs: GPIO {} unexported", pin);
        Ok(())
    }

    fn set_direction(&mut self, pin: PinId, direction: Direction) -> CoreResult<()> {
        let value = match direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        Self::write_attr(self.pin_dir(pin).join("direction"), value)
            .map_err(|e| e.into_core(pin, GpioOp::SetDirection))
    }

    fn set_value(&mut self, pin: PinId, high: bool) -> CoreResult<()> {
        let value = if high { "1" } else { "0" };
        Self::write_attr(self.pin_dir(pin).join("value"), value)
            .map_err(|e| e.into_core(pin, GpioOp::SetValue))
    }

    fn get_value(&mut self, pin: PinId) -> CoreResult<bool> {
        self.read_level(pin)
            .map_err(|e| e.into_core(pin, GpioOp::GetValue))
    }
}

/// Parse sysfs backend options
///
/// Supported options:
/// - `base=/sys/class/gpio` - sysfs GPIO directory
/// - `settle_ms=100` - pause after exporting a pin
/// - `mosi=N`, `miso=N`, `sclk=N` (or `sck`), `ce0=N` (or `cs`) - pin overrides
pub fn parse_options(options: &[(&str, &str)]) -> Result<SysfsConfig> {
    let mut config = SysfsConfig::default();

    for (key, value) in options {
        if apply_pin_option(&mut config.pins, key, value)? {
            continue;
        }
        match *key {
            "base" => {
                config.base = PathBuf::from(value);
            }
            "settle_ms" => {
                let ms: u64 = value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid settle_ms value: {}", value))
                })?;
                config.settle = Duration::from_millis(ms);
            }
            _ => {
                log::warn!("sysfs: Unknown option: {}={}", key, value);
            }
        }
    }

    check_pins(&config.pins)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchpi_core::Error;

    fn sysfs_tree(exported: &[PinId]) -> (tempfile::TempDir, SysfsGpio) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for pin in exported {
            let pin_dir = dir.path().join(format!("gpio{}", pin));
            fs::create_dir(&pin_dir).unwrap();
            fs::write(pin_dir.join("direction"), "in\n").unwrap();
            fs::write(pin_dir.join("value"), "0\n").unwrap();
        }
        let config = SysfsConfig {
            base: dir.path().to_path_buf(),
            settle: Duration::ZERO,
            ..Default::default()
        };
        let gpio = SysfsGpio::open(&config).unwrap();
        (dir, gpio)
    }

    fn read(dir: &tempfile::TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    #[test]
    fn test_export_writes_pin_number() {
        let (dir, mut gpio) = sysfs_tree(&[]);
        gpio.export(10).unwrap();
        assert_eq!(read(&dir, "export"), "10");
    }

    #[test]
    fn test_export_skipped_when_already_exported() {
        let (dir, mut gpio) = sysfs_tree(&[9]);
        gpio.export(9).unwrap();
        assert_eq!(read(&dir, "export"), "");
    }

    #[test]
    fn test_unexport_writes_pin_number() {
        let (dir, mut gpio) = sysfs_tree(&[8]);
        gpio.unexport(8).unwrap();
        assert_eq!(read(&dir, "unexport"), "8");
    }

    #[test]
    fn test_direction_and_value() {
        let (dir, mut gpio) = sysfs_tree(&[11]);
        gpio.set_direction(11, Direction::Out).unwrap();
        assert_eq!(read(&dir, "gpio11/direction"), "out");
        gpio.set_value(11, true).unwrap();
        assert_eq!(read(&dir, "gpio11/value"), "1");
        gpio.set_value(11, false).unwrap();
        assert_eq!(read(&dir, "gpio11/value"), "0");
        gpio.set_direction(11, Direction::In).unwrap();
        assert_eq!(read(&dir, "gpio11/direction"), "in");
    }

    #[test]
    fn test_get_value() {
        let (dir, mut gpio) = sysfs_tree(&[9]);
        assert!(!gpio.get_value(9).unwrap());
        fs::write(dir.path().join("gpio9/value"), "1\n").unwrap();
        assert!(gpio.get_value(9).unwrap());
    }

    #[test]
    fn test_garbage_value_is_gpio_error() {
        let (dir, mut gpio) = sysfs_tree(&[9]);
        fs::write(dir.path().join("gpio9/value"), "high\n").unwrap();
        assert_eq!(gpio.get_value(9), Err(Error::gpio(9, GpioOp::GetValue)));
    }

    #[test]
    fn test_missing_pin_is_gpio_error() {
        let (_dir, mut gpio) = sysfs_tree(&[]);
        assert_eq!(
            gpio.set_direction(10, Direction::Out),
            Err(Error::gpio(10, GpioOp::SetDirection))
        );
        assert_eq!(
            gpio.set_value(10, true),
            Err(Error::gpio(10, GpioOp::SetValue))
        );
    }

    #[test]
    fn test_open_requires_export_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let config = SysfsConfig {
            base: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(matches!(
            SysfsGpio::open(&config),
            Err(LinuxGpioError::Sysfs { .. })
        ));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("base", "/tmp/gpio"), ("cs", "7"), ("settle_ms", "0")])
            .unwrap();
        assert_eq!(config.base, PathBuf::from("/tmp/gpio"));
        assert_eq!(config.pins, PinMap::new(10, 9, 11, 7));
        assert!(config.settle.is_zero());

        let config = parse_options(&[]).unwrap();
        assert_eq!(config.base, PathBuf::from(DEFAULT_BASE));
        assert_eq!(config.pins, PinMap::default());
    }

    #[test]
    fn test_parse_options_rejects_shared_pin() {
        assert!(parse_options(&[("mosi", "9")]).is_err());
        assert!(parse_options(&[("settle_ms", "soon")]).is_err());
    }
}
