//! XPT2046 control byte and response encoding
//!
//! The control byte layout (datasheet Table 6) is
//!
//! ```text
//!   7     6    5    4     3       2       1     0
//! | S | A2 | A1 | A0 | MODE | SER/DFR | PD1 | PD0 |
//! ```
//!
//! S is the start bit and is always set. A2-A0 select what to measure and
//! MODE selects 8-bit (1) or 12-bit (0) conversion. The low three bits are
//! left clear.

use bitflags::bitflags;

bitflags! {
    /// Fields of the XPT2046 control byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlByte: u8 {
        /// Start bit, marks the byte as a control byte
        const START     = 1 << 7;
        /// Channel select, address bit 2
        const A2        = 1 << 6;
        /// Channel select, address bit 1
        const A1        = 1 << 5;
        /// Channel select, address bit 0
        const A0        = 1 << 4;
        /// Conversion mode: set for 8-bit, clear for 12-bit
        const MODE_8BIT = 1 << 3;
        /// Single-ended (set) or differential (clear) reference
        const SER_DFR   = 1 << 2;
        /// Power-down select bit 1
        const PD1       = 1 << 1;
        /// Power-down select bit 0
        const PD0       = 1 << 0;

        /// All channel select bits
        const CHANNEL = Self::A2.bits() | Self::A1.bits() | Self::A0.bits();
    }
}

/// Measurement channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// X position
    X,
    /// Y position
    Y,
    /// Z1 pressure
    Z1,
    /// Z2 pressure
    Z2,
    /// Temperature diode, first reading
    Temperature0,
    /// Temperature diode, second reading
    Temperature1,
    /// Battery voltage (VBAT)
    BatteryVoltage,
    /// Auxiliary input (AUX)
    Auxiliary,
}

/// A2 A1 A0 address of each channel, already shifted into bits 6:4
///
/// Indexed by `Channel as usize`.
const CHANNEL_SELECT: [u8; 8] = [
    0b101 << 4, // X
    0b001 << 4, // Y
    0b011 << 4, // Z1
    0b100 << 4, // Z2
    0b000 << 4, // TEMP0
    0b111 << 4, // TEMP1
    0b010 << 4, // VBAT
    0b110 << 4, // AUX
];

impl Channel {
    /// Every channel, in declaration order
    pub const ALL: [Channel; 8] = [
        Self::X,
        Self::Y,
        Self::Z1,
        Self::Z2,
        Self::Temperature0,
        Self::Temperature1,
        Self::BatteryVoltage,
        Self::Auxiliary,
    ];

    /// Channel select bits for this channel
    pub const fn select_bits(self) -> ControlByte {
        ControlByte::from_bits_truncate(CHANNEL_SELECT[self as usize])
    }

    /// Name accepted on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z1 => "z1",
            Self::Z2 => "z2",
            Self::Temperature0 => "temp0",
            Self::Temperature1 => "temp1",
            Self::BatteryVoltage => "vbat",
            Self::Auxiliary => "aux",
        }
    }

    /// Label used when printing readings
    pub const fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z1 => "Z1",
            Self::Z2 => "Z2",
            Self::Temperature0 => "Temp0",
            Self::Temperature1 => "Temp1",
            Self::BatteryVoltage => "VBatt",
            Self::Auxiliary => "Aux",
        }
    }

    /// Look a channel up by its command line name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// ADC conversion resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// 8-bit conversion
    Bits8,
    /// 12-bit conversion
    #[default]
    Bits12,
}

/// Mode bit of each resolution, indexed by `Resolution as usize`
const MODE_SELECT: [u8; 2] = [
    1 << 3, // 8-bit
    0,      // 12-bit
];

impl Resolution {
    /// Mode bit for this resolution
    pub const fn mode_bits(self) -> ControlByte {
        ControlByte::from_bits_truncate(MODE_SELECT[self as usize])
    }

    /// Conversion width in bits
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits12 => 12,
        }
    }

    /// Number of distinct conversion codes (256 or 4096)
    pub const fn full_scale(self) -> u32 {
        1 << self.bits()
    }

    /// Resolution for a conversion width, if the device supports it
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::Bits8),
            12 => Some(Self::Bits12),
            _ => None,
        }
    }
}

impl ControlByte {
    /// Control byte requesting `channel` at `resolution`
    pub const fn new(channel: Channel, resolution: Resolution) -> Self {
        Self::START
            .union(channel.select_bits())
            .union(resolution.mode_bits())
    }
}

/// Turn the two response bytes into a conversion result
///
/// 12-bit responses are laid out `0XXXXXXX XXXXX000`. 8-bit responses are
/// `0XXXXXXX X0000000`; the final bit is taken as set whenever the second
/// byte is non-zero rather than by testing bit 7 alone.
pub const fn decode(resolution: Resolution, response: [u8; 2]) -> u16 {
    let [high, low] = response;
    match resolution {
        Resolution::Bits12 => ((high as u16) << 5) | ((low as u16) >> 3),
        Resolution::Bits8 => ((high as u16) << 1) | (low != 0) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_bytes_match_datasheet() {
        let expected = [
            (Channel::X, 0xD0),
            (Channel::Y, 0x90),
            (Channel::Z1, 0xB0),
            (Channel::Z2, 0xC0),
            (Channel::Temperature0, 0x80),
            (Channel::Temperature1, 0xF0),
            (Channel::BatteryVoltage, 0xA0),
            (Channel::Auxiliary, 0xE0),
        ];
        for (channel, byte) in expected {
            assert_eq!(ControlByte::new(channel, Resolution::Bits12).bits(), byte);
            assert_eq!(
                ControlByte::new(channel, Resolution::Bits8).bits(),
                byte | 0x08
            );
        }
    }

    #[test]
    fn test_reserved_bits_always_clear() {
        for channel in Channel::ALL {
            for resolution in [Resolution::Bits8, Resolution::Bits12] {
                let ctl = ControlByte::new(channel, resolution);
                assert_eq!(ctl.bits() & 0x07, 0);
                assert!(ctl.contains(ControlByte::START));
                assert_eq!(
                    ctl.bits(),
                    0x80 | channel.select_bits().bits() | resolution.mode_bits().bits()
                );
            }
        }
    }

    #[test]
    fn test_channel_codes_are_distinct() {
        for (i, a) in Channel::ALL.iter().enumerate() {
            for b in &Channel::ALL[i + 1..] {
                assert_ne!(a.select_bits(), b.select_bits());
            }
            assert!(ControlByte::CHANNEL.contains(a.select_bits()));
        }
    }

    #[test]
    fn test_decode_12bit() {
        assert_eq!(decode(Resolution::Bits12, [0x12, 0xA0]), 0x254);
        assert_eq!(decode(Resolution::Bits12, [0x7F, 0xF8]), 0xFFF);
        // Second byte is unsigned before the shift
        assert_eq!(decode(Resolution::Bits12, [0x00, 0xFF]), 0x1F);
    }

    #[test]
    fn test_decode_8bit() {
        assert_eq!(decode(Resolution::Bits8, [0x55, 0x00]), 0xAA);
        assert_eq!(decode(Resolution::Bits8, [0x55, 0x01]), 0xAB);
        assert_eq!(decode(Resolution::Bits8, [0x55, 0x80]), 0xAB);
    }

    #[test]
    fn test_decode_8bit_any_nonzero_low_byte_sets_last_bit() {
        // Known quirk: stray low-order bits count as a set final bit
        assert_eq!(decode(Resolution::Bits8, [0x00, 0x40]), 0x01);
    }

    #[test]
    fn test_resolution() {
        assert_eq!(Resolution::default(), Resolution::Bits12);
        assert_eq!(Resolution::Bits12.full_scale(), 4096);
        assert_eq!(Resolution::Bits8.full_scale(), 256);
        assert_eq!(Resolution::from_bits(8), Some(Resolution::Bits8));
        assert_eq!(Resolution::from_bits(10), None);
    }

    #[test]
    fn test_channel_names() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_name(channel.name()), Some(channel));
        }
        assert_eq!(Channel::from_name("VBAT"), Some(Channel::BatteryVoltage));
        assert_eq!(Channel::from_name("z3"), None);
    }
}
