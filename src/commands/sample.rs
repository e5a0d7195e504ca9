//! Continuous sampling of every channel

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use touchpi_core::gpio::GpioPort;
use touchpi_core::spi::{BitbangSpi, SpiTransport};
use touchpi_core::xpt2046::{Resolution, Sample, Xpt2046};

/// Render one sample the way the sampling loop prints it
pub fn format_sample(sample: &Sample, elapsed: Duration) -> String {
    let mut out = String::new();
    for (channel, value) in &sample.channels()[..4] {
        let _ = writeln!(out, "{}: {}", channel.label(), value);
    }
    let _ = writeln!(out, "Pressure: {}", sample.pressure);
    for (channel, value) in &sample.channels()[4..] {
        let _ = writeln!(out, "{}: {}", channel.label(), value);
    }
    let _ = writeln!(out, "Total Sample Time (ms): {}", elapsed.as_millis());
    out
}

/// Sample until `count` samples were taken (0 = no limit) or `running`
/// is cleared
pub fn run_sample<G: GpioPort>(
    bus: BitbangSpi<G>,
    resolution: Resolution,
    count: u64,
    interval: Duration,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut xpt = Xpt2046::with_resolution(bus, resolution);
    let taken = sample_loop(&mut xpt, running, count, interval, |text| print!("{}", text))?;

    log::info!("Stopped after {} samples", taken);
    xpt.release().close()?;
    Ok(())
}

fn sample_loop<B, F>(
    xpt: &mut Xpt2046<B>,
    running: &AtomicBool,
    count: u64,
    interval: Duration,
    mut emit: F,
) -> Result<u64, Box<dyn std::error::Error>>
where
    B: SpiTransport,
    F: FnMut(&str),
{
    let mut taken = 0u64;
    while running.load(Ordering::SeqCst) && (count == 0 || taken < count) {
        let start = Instant::now();
        let sample = xpt.read_sample()?;
        emit(&format_sample(&sample, start.elapsed()));
        taken += 1;

        if !sample.has_pressure() {
            log::debug!("No touch (Z1 = {})", sample.z1);
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    Ok(taken)
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backends::open_backend;
    use touchpi_core::gpio::PinMap;
    use touchpi_dummy::EmulatedXpt2046;

    #[test]
    fn test_format_sample() {
        let sample = Sample {
            resolution: Resolution::Bits12,
            x: 2048,
            y: 1536,
            z1: 400,
            z2: 1200,
            pressure: 1.0,
            temperature0: 820,
            temperature1: 1010,
            battery_voltage: 2730,
            auxiliary: 0,
        };
        let text = format_sample(&sample, Duration::from_millis(3));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "X: 2048",
                "Y: 1536",
                "Z1: 400",
                "Z2: 1200",
                "Pressure: 1",
                "Temp0: 820",
                "Temp1: 1010",
                "VBatt: 2730",
                "Aux: 0",
                "Total Sample Time (ms): 3",
            ]
        );
    }

    #[test]
    fn test_loop_stops_after_count() {
        let bus = open_backend("dummy:x=1024,aux=7").unwrap();
        let mut xpt = Xpt2046::new(bus);
        let running = AtomicBool::new(true);
        let mut printed = Vec::new();
        let taken = sample_loop(&mut xpt, &running, 2, Duration::ZERO, |t| {
            printed.push(t.to_string())
        })
        .unwrap();
        assert_eq!(taken, 2);
        assert_eq!(printed.len(), 2);
        assert!(printed[0].starts_with("X: 1024\n"));
        assert!(printed[1].contains("Aux: 7\n"));
        xpt.release().close().unwrap();
    }

    #[test]
    fn test_loop_honors_stop_flag() {
        let bus = open_backend("dummy").unwrap();
        let mut xpt = Xpt2046::new(bus);
        let running = AtomicBool::new(false);
        let taken = sample_loop(&mut xpt, &running, 0, Duration::ZERO, |_| {}).unwrap();
        assert_eq!(taken, 0);
    }

    #[test]
    fn test_interrupt_during_open_releases_pins() {
        let mut emu = EmulatedXpt2046::new_default();
        let pins = PinMap::default();
        // Cleared by the handler while the backend was still opening
        let running = AtomicBool::new(false);

        let bus = BitbangSpi::open(&mut emu, pins).unwrap();
        run_sample(bus, Resolution::Bits12, 0, Duration::ZERO, &running).unwrap();

        assert!(emu.conversions().is_empty());
        for pin in [pins.mosi, pins.miso, pins.sclk, pins.ce0] {
            assert!(!emu.is_exported(pin), "GPIO {} still exported", pin);
        }
    }

    #[test]
    fn test_sample_releases_pins_after_count() {
        let mut emu = EmulatedXpt2046::new_default();
        let pins = PinMap::default();
        let running = AtomicBool::new(true);

        let bus = BitbangSpi::open(&mut emu, pins).unwrap();
        run_sample(bus, Resolution::Bits12, 1, Duration::ZERO, &running).unwrap();

        // One sample is eight channels plus three for the pressure estimate
        assert_eq!(emu.conversions().len(), 11);
        for pin in [pins.mosi, pins.miso, pins.sclk, pins.ce0] {
            assert!(!emu.is_exported(pin));
        }
    }

    #[test]
    fn test_no_touch_prints_non_finite_pressure() {
        let bus = open_backend("dummy:touch=off").unwrap();
        let mut xpt = Xpt2046::new(bus);
        let running = AtomicBool::new(true);
        let mut printed = String::new();
        sample_loop(&mut xpt, &running, 1, Duration::ZERO, |t| printed.push_str(t)).unwrap();
        assert!(printed.contains("Pressure: NaN\n"));
    }
}
