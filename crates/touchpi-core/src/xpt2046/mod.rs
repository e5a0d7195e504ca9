//! XPT2046 resistive touch screen controller
//!
//! The XPT2046 is an 8-channel ADC with touch panel drivers. Each conversion
//! is requested with a one-byte command and answered with 16 clocked-in bits.
//! [`command`] holds the byte-level encoding, [`driver`] the transactions.

pub mod command;
pub mod driver;

pub use command::{decode, Channel, ControlByte, Resolution};
pub use driver::{touch_pressure, Sample, Xpt2046, RESPONSE_BITS};
