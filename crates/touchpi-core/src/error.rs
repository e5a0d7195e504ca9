//! Error types for touchpi-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate and by every GPIO backend.

use core::fmt;

use crate::gpio::PinId;

/// GPIO operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioOp {
    /// Making the pin available to user space
    Export,
    /// Handing the pin back to the system
    Unexport,
    /// Configuring the pin as input or output
    SetDirection,
    /// Driving an output level
    SetValue,
    /// Sampling an input level
    GetValue,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The GPIO layer rejected an operation on a pin
    Gpio {
        /// Pin the operation targeted
        pin: PinId,
        /// Operation that failed
        op: GpioOp,
    },
    /// The engine has not exported and configured its pins yet
    NotReady,
    /// A receive was requested for zero bits
    InvalidBitCount,
    /// Provided buffer is too small for the operation
    BufferTooSmall,
    /// The same pin is assigned to more than one role
    PinConflict(PinId),
}

impl Error {
    /// Shorthand for a GPIO failure
    pub const fn gpio(pin: PinId, op: GpioOp) -> Self {
        Self::Gpio { pin, op }
    }
}

impl fmt::Display for GpioOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Export => "export",
            Self::Unexport => "unexport",
            Self::SetDirection => "set direction of",
            Self::SetValue => "set value of",
            Self::GetValue => "get value of",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio { pin, op } => write!(f, "failed to {} GPIO {}", op, pin),
            Self::NotReady => write!(f, "GPIO engine not initialized"),
            Self::InvalidBitCount => write!(f, "bit count must be at least 1"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::PinConflict(pin) => write!(f, "GPIO {} assigned to more than one role", pin),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
