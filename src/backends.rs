//! GPIO backend registration and dispatch
//!
//! This module provides a centralized registry for all backends, with support
//! for feature-gated inclusion and dynamic help text generation.

use touchpi_core::gpio::GpioPort;
use touchpi_core::spi::BitbangSpi;

/// Engine over whichever backend was selected
pub type Bus = BitbangSpi<Box<dyn GpioPort>>;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "Emulated XPT2046 for testing (x=,y=,z1=,z2=,temp0=,temp1=,vbat=,aux=,touch=on|off)",
    });

    #[cfg(feature = "linux-gpio")]
    backends.push(BackendInfo {
        name: "sysfs",
        aliases: &["linux_sysfs"],
        description: "Linux sysfs GPIO (base=/sys/class/gpio,settle_ms=<ms>)",
    });

    #[cfg(feature = "linux-gpio")]
    backends.push(BackendInfo {
        name: "cdev",
        aliases: &["linux_gpio", "gpiochip"],
        description: "Linux GPIO character device (dev=/dev/gpiochipN or gpiochip=N)",
    });

    backends
}

/// Generate help text listing all available backends
pub fn backend_help() -> String {
    let mut help = String::from("Available backends:\n");
    for b in available_backends() {
        let aliases = if b.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", b.aliases.join(", "))
        };
        help.push_str(&format!("  {:<8} - {}{}\n", b.name, b.description, aliases));
    }
    help.push_str(
        "\nAll backends accept pin overrides: mosi=N,miso=N,sclk=N (or sck),ce0=N (or cs)\n\
         Defaults are the Raspberry Pi SPI0 pins: mosi=10,miso=9,sclk=11,ce0=8\n",
    );
    help
}

/// Get a short comma-separated list of backend names
pub fn backend_names_short() -> String {
    let backends = available_backends();
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Resolve a backend name or alias to its primary name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> Result<(&str, Vec<(&str, &str)>), String> {
    let (name, opts) = s.split_once(':').unwrap_or((s, ""));

    let mut options = Vec::new();
    if !opts.is_empty() {
        for opt in opts.split(',') {
            match opt.split_once('=') {
                Some(pair) => options.push(pair),
                None => {
                    return Err(format!(
                        "Invalid parameter format: '{}' (expected key=value)",
                        opt
                    ))
                }
            }
        }
    }

    Ok((name, options))
}

/// Open a backend and set up the bus pins
///
/// The backend string can be just the name (e.g., "sysfs") or include
/// parameters (e.g., "cdev:gpiochip=1,cs=7").
#[allow(unused_variables)]
pub fn open_backend(backend: &str) -> Result<Bus, Box<dyn std::error::Error>> {
    let (name, options) = parse_backend_string(backend)?;

    let canonical_name = match find_backend(name) {
        Some(n) => n,
        None => return Err(unknown_backend_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            use touchpi_dummy::{parse_options, EmulatedXpt2046};
            log::info!("Opening emulated XPT2046...");
            let config =
                parse_options(&options).map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            let pins = config.pins;
            let port: Box<dyn GpioPort> = Box::new(EmulatedXpt2046::new(config));
            Ok(BitbangSpi::open(port, pins)?)
        }
        #[cfg(feature = "linux-gpio")]
        "sysfs" => {
            log::info!("Opening sysfs GPIO backend...");
            touchpi_linux_gpio::open_sysfs_spi(&options).map_err(|e| {
                format!(
                    "Failed to open sysfs GPIO: {}\n\
                     Make sure /sys/class/gpio exists and you have write permission.\n\
                     You may need to: sudo usermod -aG gpio $USER",
                    e
                )
                .into()
            })
        }
        #[cfg(feature = "linux-gpio")]
        "cdev" => {
            log::info!("Opening GPIO character device backend...");
            touchpi_linux_gpio::open_cdev_spi(&options).map_err(|e| {
                format!(
                    "Failed to open GPIO character device: {}\n\
                     Make sure the chip exists and you have read/write permissions.",
                    e
                )
                .into()
            })
        }
        _ => Err(unknown_backend_error(name)),
    }
}

fn unknown_backend_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown backend: {}\n\n", name);
    msg.push_str(&backend_help());
    msg.push_str("\nUse 'touchpi list-backends' for more details");
    msg.into()
}
