//! XPT2046 driver
//!
//! [`Xpt2046`] turns channel requests into control bytes, runs one
//! chip-select framed exchange per request over a [`SpiTransport`] and
//! decodes the answer according to the current [`Resolution`].

use super::command::{decode, Channel, ControlByte, Resolution};
use crate::error::Result;
use crate::spi::SpiTransport;

/// Bits clocked in after every control byte, whatever the resolution
pub const RESPONSE_BITS: usize = 16;

/// XPT2046 touch screen controller
pub struct Xpt2046<B: SpiTransport> {
    bus: B,
    resolution: Resolution,
}

impl<B: SpiTransport> Xpt2046<B> {
    /// Create a driver using 12-bit conversions
    pub fn new(bus: B) -> Self {
        Self::with_resolution(bus, Resolution::default())
    }

    /// Create a driver with an explicit conversion resolution
    pub fn with_resolution(bus: B, resolution: Resolution) -> Self {
        Self { bus, resolution }
    }

    /// Current conversion resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Change the conversion resolution used from the next request on
    pub fn set_resolution(&mut self, resolution: Resolution) {
        log::debug!("xpt2046: switching to {}-bit conversions", resolution.bits());
        self.resolution = resolution;
    }

    /// The underlying transport
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give the transport back
    pub fn release(self) -> B {
        self.bus
    }

    /// Select, send the control byte, read the response, deselect
    ///
    /// Deselect is attempted even when the exchange fails.
    fn exchange(&mut self, control: ControlByte) -> Result<[u8; 2]> {
        let mut response = [0u8; 2];

        self.bus.select()?;
        let result = self
            .bus
            .transmit(&[control.bits()])
            .and_then(|()| self.bus.receive_into(RESPONSE_BITS, &mut response));
        let deselect = self.bus.deselect();

        result?;
        deselect?;
        Ok(response)
    }

    /// Perform one conversion on `channel`
    pub fn read_channel(&mut self, channel: Channel) -> Result<u16> {
        let resolution = self.resolution;
        let control = ControlByte::new(channel, resolution);
        let response = self.exchange(control)?;
        let value = decode(resolution, response);

        log::trace!(
            "xpt2046: {} = {} (control 0x{:02X}, response {:02X?})",
            channel.label(),
            value,
            control.bits(),
            response
        );
        Ok(value)
    }

    /// Read the X position
    pub fn read_x(&mut self) -> Result<u16> {
        self.read_channel(Channel::X)
    }

    /// Read the Y position
    pub fn read_y(&mut self) -> Result<u16> {
        self.read_channel(Channel::Y)
    }

    /// Read Z1
    pub fn read_z1(&mut self) -> Result<u16> {
        self.read_channel(Channel::Z1)
    }

    /// Read Z2
    pub fn read_z2(&mut self) -> Result<u16> {
        self.read_channel(Channel::Z2)
    }

    /// Read the first temperature measurement
    pub fn read_temperature0(&mut self) -> Result<u16> {
        self.read_channel(Channel::Temperature0)
    }

    /// Read the second temperature measurement
    pub fn read_temperature1(&mut self) -> Result<u16> {
        self.read_channel(Channel::Temperature1)
    }

    /// Read the battery voltage input
    pub fn read_battery_voltage(&mut self) -> Result<u16> {
        self.read_channel(Channel::BatteryVoltage)
    }

    /// Read the auxiliary input
    pub fn read_auxiliary(&mut self) -> Result<u16> {
        self.read_channel(Channel::Auxiliary)
    }

    /// Estimate touch pressure from X, Z1 and Z2
    ///
    /// The three channels are read in separate transfers, so a touch that
    /// changes between them gives an inconsistent estimate. Callers that
    /// need a coherent triple must hold the panel still themselves.
    ///
    /// See [`touch_pressure`] for the formula and its non-finite cases.
    pub fn read_touch_pressure(&mut self) -> Result<f64> {
        let x = self.read_x()?;
        let z1 = self.read_z1()?;
        let z2 = self.read_z2()?;
        Ok(touch_pressure(x, z1, z2, self.resolution))
    }

    /// Read every channel and the pressure estimate
    ///
    /// Order: X, Y, Z1, Z2, pressure (three more reads), Temp0, Temp1,
    /// VBatt, Aux.
    pub fn read_sample(&mut self) -> Result<Sample> {
        Ok(Sample {
            resolution: self.resolution,
            x: self.read_x()?,
            y: self.read_y()?,
            z1: self.read_z1()?,
            z2: self.read_z2()?,
            pressure: self.read_touch_pressure()?,
            temperature0: self.read_temperature0()?,
            temperature1: self.read_temperature1()?,
            battery_voltage: self.read_battery_voltage()?,
            auxiliary: self.read_auxiliary()?,
        })
    }
}

/// Touch resistance ratio from the datasheet's first formula
///
/// `(x / full_scale) * (z2 / z1 - 1)` with full scale 4096 for 12-bit and
/// 256 for 8-bit readings. The plate resistance factor is left out. Light
/// touches give larger values than firm ones.
///
/// When `z1` is zero the result is infinite or NaN; treat any non-finite
/// value as "no touch".
pub fn touch_pressure(x: u16, z1: u16, z2: u16, resolution: Resolution) -> f64 {
    let divisor = f64::from(resolution.full_scale());
    (f64::from(x) / divisor) * ((f64::from(z2) / f64::from(z1)) - 1.0)
}

/// One reading of every channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Resolution the sample was taken at
    pub resolution: Resolution,
    /// X position
    pub x: u16,
    /// Y position
    pub y: u16,
    /// Z1
    pub z1: u16,
    /// Z2
    pub z2: u16,
    /// Pressure estimate, possibly non-finite
    pub pressure: f64,
    /// First temperature reading
    pub temperature0: u16,
    /// Second temperature reading
    pub temperature1: u16,
    /// Battery voltage input
    pub battery_voltage: u16,
    /// Auxiliary input
    pub auxiliary: u16,
}

impl Sample {
    /// Whether the pressure estimate is a usable number
    pub fn has_pressure(&self) -> bool {
        self.pressure.is_finite()
    }

    /// Raw channel readings paired with their channel
    pub fn channels(&self) -> [(Channel, u16); 8] {
        [
            (Channel::X, self.x),
            (Channel::Y, self.y),
            (Channel::Z1, self.z1),
            (Channel::Z2, self.z2),
            (Channel::Temperature0, self.temperature0),
            (Channel::Temperature1, self.temperature1),
            (Channel::BatteryVoltage, self.battery_voltage),
            (Channel::Auxiliary, self.auxiliary),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, GpioOp};
    use alloc::collections::VecDeque;
    use alloc::vec::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Select,
        Deselect,
        Transmit(Vec<u8>),
        Receive(usize),
    }

    /// Transport that answers every receive with the next scripted response
    #[derive(Default)]
    struct ScriptedBus {
        events: Vec<Event>,
        responses: VecDeque<[u8; 2]>,
        fail_transmit: bool,
    }

    impl ScriptedBus {
        fn new(responses: &[[u8; 2]]) -> Self {
            Self {
                responses: responses.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn control_bytes(&self) -> Vec<u8> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Transmit(data) => Some(data[0]),
                    _ => None,
                })
                .collect()
        }
    }

    impl SpiTransport for ScriptedBus {
        fn select(&mut self) -> Result<()> {
            self.events.push(Event::Select);
            Ok(())
        }

        fn deselect(&mut self) -> Result<()> {
            self.events.push(Event::Deselect);
            Ok(())
        }

        fn transmit(&mut self, data: &[u8]) -> Result<()> {
            if self.fail_transmit {
                return Err(Error::gpio(10, GpioOp::SetValue));
            }
            self.events.push(Event::Transmit(data.to_vec()));
            Ok(())
        }

        fn receive_into(&mut self, bits: usize, buf: &mut [u8]) -> Result<usize> {
            self.events.push(Event::Receive(bits));
            let response = self.responses.pop_front().unwrap_or([0, 0]);
            buf[..2].copy_from_slice(&response);
            Ok(2)
        }
    }

    #[test]
    fn test_read_channel_transaction() {
        let mut bus = ScriptedBus::new(&[[0x12, 0xA0]]);
        let mut xpt = Xpt2046::new(&mut bus);
        assert_eq!(xpt.read_y().unwrap(), 0x254);

        assert_eq!(
            bus.events,
            [
                Event::Select,
                Event::Transmit(alloc::vec![0x90]),
                Event::Receive(16),
                Event::Deselect,
            ]
        );
    }

    #[test]
    fn test_named_reads_use_matching_channels() {
        let mut bus = ScriptedBus::default();
        let mut xpt = Xpt2046::new(&mut bus);
        xpt.read_x().unwrap();
        xpt.read_y().unwrap();
        xpt.read_z1().unwrap();
        xpt.read_z2().unwrap();
        xpt.read_temperature0().unwrap();
        xpt.read_temperature1().unwrap();
        xpt.read_battery_voltage().unwrap();
        xpt.read_auxiliary().unwrap();
        assert_eq!(
            bus.control_bytes(),
            [0xD0, 0x90, 0xB0, 0xC0, 0x80, 0xF0, 0xA0, 0xE0]
        );
    }

    #[test]
    fn test_resolution_switch_between_reads() {
        let mut bus = ScriptedBus::new(&[[0x55, 0x01], [0x12, 0xA0], [0x55, 0x00]]);
        let mut xpt = Xpt2046::with_resolution(&mut bus, Resolution::Bits8);
        assert_eq!(xpt.read_x().unwrap(), 0xAB);
        xpt.set_resolution(Resolution::Bits12);
        assert_eq!(xpt.read_x().unwrap(), 0x254);
        xpt.set_resolution(Resolution::Bits8);
        assert_eq!(xpt.read_x().unwrap(), 0xAA);

        assert_eq!(bus.control_bytes(), [0xD8, 0xD0, 0xD8]);
    }

    #[test]
    fn test_deselect_after_failed_transmit() {
        let mut bus = ScriptedBus {
            fail_transmit: true,
            ..Default::default()
        };
        let mut xpt = Xpt2046::new(&mut bus);
        assert_eq!(xpt.read_x(), Err(Error::gpio(10, GpioOp::SetValue)));
        assert_eq!(bus.events, [Event::Select, Event::Deselect]);
    }

    #[test]
    fn test_touch_pressure_formula() {
        assert_eq!(touch_pressure(2048, 1000, 3000, Resolution::Bits12), 1.0);
        assert_eq!(touch_pressure(128, 100, 150, Resolution::Bits8), 0.25);
        assert_eq!(touch_pressure(0, 100, 150, Resolution::Bits12), 0.0);
    }

    #[test]
    fn test_touch_pressure_without_z1_is_not_finite() {
        assert!(!touch_pressure(1000, 0, 0, Resolution::Bits12).is_finite());
        assert!(!touch_pressure(1000, 0, 500, Resolution::Bits12).is_finite());
        assert!(!touch_pressure(1000, 0, 4095, Resolution::Bits8).is_finite());
    }

    #[test]
    fn test_read_touch_pressure_reads_three_channels() {
        // X = 2048, Z1 = 1000, Z2 = 3000 in 12-bit layout
        let encode = |v: u16| [(v >> 5) as u8, ((v & 0x1F) << 3) as u8];
        let mut bus = ScriptedBus::new(&[encode(2048), encode(1000), encode(3000)]);
        let mut xpt = Xpt2046::new(&mut bus);
        assert_eq!(xpt.read_touch_pressure().unwrap(), 1.0);
        assert_eq!(bus.control_bytes(), [0xD0, 0xB0, 0xC0]);
    }

    #[test]
    fn test_read_touch_pressure_with_zero_z1() {
        let mut bus = ScriptedBus::new(&[[0x1F, 0x40], [0, 0], [0x10, 0x00]]);
        let mut xpt = Xpt2046::new(&mut bus);
        let pressure = xpt.read_touch_pressure().unwrap();
        assert!(!pressure.is_finite());
    }

    #[test]
    fn test_read_sample_order() {
        let mut bus = ScriptedBus::default();
        let mut xpt = Xpt2046::new(&mut bus);
        let sample = xpt.read_sample().unwrap();
        assert!(!sample.has_pressure());
        assert_eq!(sample.resolution, Resolution::Bits12);
        assert_eq!(
            bus.control_bytes(),
            [0xD0, 0x90, 0xB0, 0xC0, 0xD0, 0xB0, 0xC0, 0x80, 0xF0, 0xA0, 0xE0]
        );
    }
}
