//! touchpi-dummy - In-memory XPT2046 emulator for testing
//!
//! This crate provides a [`GpioPort`](touchpi_core::gpio::GpioPort) whose pins are wired to an emulated
//! XPT2046. It's useful for testing the bitbang engine and the driver, and
//! for running the CLI without real hardware.
//!
//! While chip select is low, every rising SCLK edge shifts MOSI into the
//! command register until a control byte (start bit first) is complete.
//! Following rising edges shift the answer out on MISO: one busy bit, the
//! conversion result MSB first, then zeros. Raising chip select resets the
//! serial interface.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;
#[cfg(feature = "alloc")]
use alloc::format;
#[cfg(feature = "alloc")]
use alloc::string::String;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use touchpi_core::gpio::{Direction, PinId, PinMap};
use touchpi_core::xpt2046::Channel;

#[cfg(feature = "alloc")]
use touchpi_core::error::{Error, GpioOp, Result};
#[cfg(feature = "alloc")]
use touchpi_core::gpio::{GpioPort, PinRole};
#[cfg(feature = "alloc")]
use touchpi_core::xpt2046::{ControlByte, Resolution};

/// Largest 12-bit conversion code
const MAX_CODE: u16 = 0x0FFF;

/// Configuration for the emulated controller
///
/// Channel values are 12-bit conversion codes; 8-bit conversions report
/// the top eight bits.
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Pins the controller is wired to
    pub pins: PinMap,
    /// X position
    pub x: u16,
    /// Y position
    pub y: u16,
    /// Z1
    pub z1: u16,
    /// Z2
    pub z2: u16,
    /// First temperature reading
    pub temperature0: u16,
    /// Second temperature reading
    pub temperature1: u16,
    /// Battery voltage input
    pub battery_voltage: u16,
    /// Auxiliary input
    pub auxiliary: u16,
}

impl Default for DummyConfig {
    fn default() -> Self {
        // A firm touch near the middle of the panel
        Self {
            pins: PinMap::default(),
            x: 2048,
            y: 1536,
            z1: 400,
            z2: 1200,
            temperature0: 820,
            temperature1: 1010,
            battery_voltage: 2730,
            auxiliary: 0,
        }
    }
}

impl DummyConfig {
    /// Configured 12-bit value of a channel
    pub fn value(&self, channel: Channel) -> u16 {
        let value = match channel {
            Channel::X => self.x,
            Channel::Y => self.y,
            Channel::Z1 => self.z1,
            Channel::Z2 => self.z2,
            Channel::Temperature0 => self.temperature0,
            Channel::Temperature1 => self.temperature1,
            Channel::BatteryVoltage => self.battery_voltage,
            Channel::Auxiliary => self.auxiliary,
        };
        value & MAX_CODE
    }

    /// Change the value reported for a channel
    pub fn set_value(&mut self, channel: Channel, value: u16) {
        let slot = match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Z1 => &mut self.z1,
            Channel::Z2 => &mut self.z2,
            Channel::Temperature0 => &mut self.temperature0,
            Channel::Temperature1 => &mut self.temperature1,
            Channel::BatteryVoltage => &mut self.battery_voltage,
            Channel::Auxiliary => &mut self.auxiliary,
        };
        *slot = value & MAX_CODE;
    }

    /// Simulate lifting the stylus (no pressure on the panel)
    pub fn release_touch(&mut self) {
        self.x = 0;
        self.y = 0;
        self.z1 = 0;
        self.z2 = 0;
    }
}

/// Parse emulator options
///
/// Supported options:
/// - `x=N`, `y=N`, `z1=N`, `z2=N`, `temp0=N`, `temp1=N`, `vbat=N`, `aux=N` -
///   12-bit channel values (0-4095)
/// - `touch=off` - no pressure on the panel
/// - `mosi=N`, `miso=N`, `sclk=N` (or `sck`), `ce0=N` (or `cs`) - pin overrides
#[cfg(feature = "alloc")]
pub fn parse_options(options: &[(&str, &str)]) -> core::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        if let Some(role) = PinRole::from_key(key) {
            let pin = value
                .parse()
                .map_err(|_| format!("Invalid {} pin: {}", role.name(), value))?;
            config.pins.set(role, pin);
        } else if let Some(channel) = Channel::from_name(key) {
            let code: u16 = value
                .parse()
                .ok()
                .filter(|&v| v <= MAX_CODE)
                .ok_or_else(|| format!("Invalid {} value: {} (expected 0-4095)", key, value))?;
            config.set_value(channel, code);
        } else if *key == "touch" {
            match *value {
                "on" => {}
                "off" => config.release_touch(),
                _ => return Err(format!("Invalid touch value: {} (expected on or off)", value)),
            }
        } else {
            log::warn!("dummy: Unknown option: {}={}", key, value);
        }
    }

    config.pins.validate().map_err(|e| format!("{}", e))?;
    Ok(config)
}

/// One call made against the emulated port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    /// Pin exported
    Export(PinId),
    /// Pin unexported
    Unexport(PinId),
    /// Direction configured
    Direction(PinId, Direction),
    /// Output driven
    Set(PinId, bool),
    /// Level sampled, with the level returned
    Get(PinId, bool),
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy)]
struct Line {
    direction: Direction,
    level: bool,
}

/// Serial interface state of the controller
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, Default)]
struct Interface {
    command: u8,
    command_bits: u8,
    /// Output frame of the running conversion, MSB first
    frame: Option<u16>,
    clocks_out: usize,
    miso: bool,
}

/// Emulated XPT2046 reachable through [`GpioPort`]
#[cfg(feature = "alloc")]
pub struct EmulatedXpt2046 {
    config: DummyConfig,
    lines: BTreeMap<PinId, Line>,
    interface: Interface,
    trace: Vec<PinEvent>,
    conversions: Vec<ControlByte>,
    fail: Option<(PinId, GpioOp)>,
}

#[cfg(feature = "alloc")]
impl EmulatedXpt2046 {
    /// Create an emulator with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            lines: BTreeMap::new(),
            interface: Interface::default(),
            trace: Vec::new(),
            conversions: Vec::new(),
            fail: None,
        }
    }

    /// Create an emulator with default readings on the Raspberry Pi pins
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut DummyConfig {
        &mut self.config
    }

    /// Every port call so far
    pub fn trace(&self) -> &[PinEvent] {
        &self.trace
    }

    /// Forget the recorded calls
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Control bytes the controller has accepted, in order
    pub fn conversions(&self) -> &[ControlByte] {
        &self.conversions
    }

    /// Whether a pin is currently exported
    pub fn is_exported(&self, pin: PinId) -> bool {
        self.lines.contains_key(&pin)
    }

    /// Current level of an exported pin
    pub fn level(&self, pin: PinId) -> Option<bool> {
        self.lines.get(&pin).map(|line| line.level)
    }

    /// Make the next matching call fail with [`Error::Gpio`]
    pub fn fail_on(&mut self, pin: PinId, op: GpioOp) {
        self.fail = Some((pin, op));
    }

    /// Stop injecting failures
    pub fn clear_failure(&mut self) {
        self.fail = None;
    }

    /// Rising SCLK edges recorded in the trace
    pub fn clock_pulses(&self) -> usize {
        let sclk = self.config.pins.sclk;
        self.trace
            .iter()
            .filter(|e| matches!(e, PinEvent::Set(pin, true) if *pin == sclk))
            .count()
    }

    fn check(&self, pin: PinId, op: GpioOp) -> Result<()> {
        match self.fail {
            Some((p, o)) if p == pin && o == op => {
                log::debug!("dummy: injected failure on GPIO {} ({:?})", pin, op);
                Err(Error::gpio(pin, op))
            }
            _ => Ok(()),
        }
    }

    fn line_mut(&mut self, pin: PinId, op: GpioOp) -> Result<&mut Line> {
        self.lines.get_mut(&pin).ok_or(Error::gpio(pin, op))
    }

    fn chip_selected(&self) -> bool {
        self.level(self.config.pins.ce0) == Some(false)
    }

    fn reset_interface(&mut self) {
        self.interface = Interface::default();
    }

    /// Start a conversion for a complete control byte
    fn latch_command(&mut self) {
        let control = ControlByte::from_bits_retain(self.interface.command);
        let channel = Channel::ALL
            .into_iter()
            .find(|c| c.select_bits() == control.intersection(ControlByte::CHANNEL));
        let resolution = if control.contains(ControlByte::MODE_8BIT) {
            Resolution::Bits8
        } else {
            Resolution::Bits12
        };

        // Every channel code is assigned, so the lookup cannot miss
        let value = channel.map(|c| self.config.value(c)).unwrap_or(0);
        let frame = match resolution {
            Resolution::Bits12 => value << 3,
            Resolution::Bits8 => (value >> 4) << 7,
        };

        log::trace!(
            "dummy: control 0x{:02X} -> {:?} {}-bit = {}",
            control.bits(),
            channel,
            resolution.bits(),
            value
        );

        self.conversions.push(control);
        self.interface.frame = Some(frame);
        self.interface.clocks_out = 0;
        self.interface.miso = false;
    }

    fn rising_edge(&mut self) {
        if !self.chip_selected() {
            return;
        }

        match self.interface.frame {
            None => {
                let mosi = self.level(self.config.pins.mosi).unwrap_or(false);
                // Leading zeros before the start bit are ignored
                if self.interface.command_bits == 0 && !mosi {
                    return;
                }
                self.interface.command = (self.interface.command << 1) | mosi as u8;
                self.interface.command_bits += 1;
                if self.interface.command_bits == 8 {
                    self.latch_command();
                }
            }
            Some(frame) => {
                let index = self.interface.clocks_out;
                self.interface.clocks_out += 1;
                self.interface.miso = index < 16 && (frame >> (15 - index)) & 1 != 0;
            }
        }
    }
}

#[cfg(feature = "alloc")]
impl GpioPort for EmulatedXpt2046 {
    fn export(&mut self, pin: PinId) -> Result<()> {
        self.check(pin, GpioOp::Export)?;
        if self.lines.contains_key(&pin) {
            return Err(Error::gpio(pin, GpioOp::Export));
        }
        self.lines.insert(
            pin,
            Line {
                direction: Direction::In,
                level: false,
            },
        );
        self.trace.push(PinEvent::Export(pin));
        Ok(())
    }

    fn unexport(&mut self, pin: PinId) -> Result<()> {
        self.check(pin, GpioOp::Unexport)?;
        if self.lines.remove(&pin).is_none() {
            return Err(Error::gpio(pin, GpioOp::Unexport));
        }
        if pin == self.config.pins.ce0 {
            self.reset_interface();
        }
        self.trace.push(PinEvent::Unexport(pin));
        Ok(())
    }

    fn set_direction(&mut self, pin: PinId, direction: Direction) -> Result<()> {
        self.check(pin, GpioOp::SetDirection)?;
        self.line_mut(pin, GpioOp::SetDirection)?.direction = direction;
        self.trace.push(PinEvent::Direction(pin, direction));
        Ok(())
    }

    fn set_value(&mut self, pin: PinId, high: bool) -> Result<()> {
        self.check(pin, GpioOp::SetValue)?;
        let line = self.line_mut(pin, GpioOp::SetValue)?;
        if line.direction != Direction::Out {
            return Err(Error::gpio(pin, GpioOp::SetValue));
        }
        let was_high = line.level;
        line.level = high;
        self.trace.push(PinEvent::Set(pin, high));

        let pins = self.config.pins;
        if pin == pins.ce0 && was_high != high {
            self.reset_interface();
        } else if pin == pins.sclk && !was_high && high {
            self.rising_edge();
        }
        Ok(())
    }

    fn get_value(&mut self, pin: PinId) -> Result<bool> {
        self.check(pin, GpioOp::GetValue)?;
        let miso = self.interface.miso;
        let is_miso = pin == self.config.pins.miso;
        let line = self.line_mut(pin, GpioOp::GetValue)?;
        let level = if is_miso && line.direction == Direction::In {
            miso
        } else {
            line.level
        };
        self.trace.push(PinEvent::Get(pin, level));
        Ok(level)
    }
}
