//! Single channel reading

use std::sync::atomic::{AtomicBool, Ordering};

use touchpi_core::gpio::GpioPort;
use touchpi_core::spi::BitbangSpi;
use touchpi_core::xpt2046::{Channel, Resolution, Xpt2046};

/// Read one channel once and print it
///
/// Nothing is read if `running` was cleared while the backend was opening;
/// the pins are released either way.
pub fn run_read<G: GpioPort>(
    bus: BitbangSpi<G>,
    channel: Channel,
    resolution: Resolution,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !running.load(Ordering::SeqCst) {
        bus.close()?;
        return Err("Interrupted before reading".into());
    }

    let mut xpt = Xpt2046::with_resolution(bus, resolution);
    let value = xpt.read_channel(channel)?;
    println!("{}: {}", channel.label(), value);
    xpt.release().close()?;
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use touchpi_core::gpio::PinMap;
    use touchpi_dummy::EmulatedXpt2046;

    #[test]
    fn test_interrupted_read_releases_pins() {
        let mut emu = EmulatedXpt2046::new_default();
        let pins = PinMap::default();
        let running = AtomicBool::new(false);

        let bus = BitbangSpi::open(&mut emu, pins).unwrap();
        assert!(run_read(bus, Channel::X, Resolution::Bits12, &running).is_err());

        assert!(emu.conversions().is_empty());
        for pin in [pins.mosi, pins.miso, pins.sclk, pins.ce0] {
            assert!(!emu.is_exported(pin), "GPIO {} still exported", pin);
        }
    }

    #[test]
    fn test_read_releases_pins() {
        let mut emu = EmulatedXpt2046::new_default();
        let pins = PinMap::default();
        let running = AtomicBool::new(true);

        let bus = BitbangSpi::open(&mut emu, pins).unwrap();
        run_read(bus, Channel::Z1, Resolution::Bits12, &running).unwrap();

        assert_eq!(emu.conversions().len(), 1);
        assert!(!emu.is_exported(pins.ce0));
        assert!(!emu.is_exported(pins.sclk));
    }
}
