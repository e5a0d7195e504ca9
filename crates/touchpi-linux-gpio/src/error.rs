//! Error types for Linux GPIO operations

use std::path::PathBuf;

use thiserror::Error;
use touchpi_core::error::{Error as CoreError, GpioOp};
use touchpi_core::gpio::PinId;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to open GPIO chip
    #[error("Failed to open GPIO chip '{path}': {source}")]
    ChipOpenFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to request a GPIO line
    #[error("Failed to request GPIO line {line} on '{chip}': {source}")]
    LineRequestFailed {
        chip: String,
        line: PinId,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to set GPIO line value
    #[error("Failed to set GPIO line {line} value: {source}")]
    SetValueFailed {
        line: PinId,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to get GPIO line value
    #[error("Failed to get GPIO line {line} value: {source}")]
    GetValueFailed {
        line: PinId,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to reconfigure a GPIO line
    #[error("Failed to reconfigure GPIO line {line}: {source}")]
    ReconfigureFailed {
        line: PinId,
        #[source]
        source: gpiocdev::Error,
    },

    /// Line used before being exported
    #[error("GPIO line {0} is not exported")]
    LineNotExported(PinId),

    /// Line value accessed before a direction was configured
    #[error("GPIO line {0} has no direction configured")]
    LineNotRequested(PinId),

    /// Reading or writing a sysfs attribute failed
    #[error("sysfs access to '{}' failed: {source}", path.display())]
    Sysfs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sysfs value attribute held something other than 0 or 1
    #[error("Unexpected value '{value}' in '{}'", path.display())]
    InvalidValue { path: PathBuf, value: String },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid GPIO line number
    #[error("Invalid GPIO line number for {name}: {value}")]
    InvalidLineNumber { name: &'static str, value: String },
}

impl LinuxGpioError {
    /// Log the OS detail and collapse into the core error for `pin`/`op`
    pub(crate) fn into_core(self, pin: PinId, op: GpioOp) -> CoreError {
        log::error!("{}", self);
        CoreError::gpio(pin, op)
    }
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
