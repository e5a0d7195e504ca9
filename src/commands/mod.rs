//! CLI command implementations
//!
//! Every command takes an already opened bus and hands it back to the
//! backend through `close` when done, so pins are released with their
//! errors reported rather than only logged on drop.
//!
//! The stop flag is shared with the SIGINT/SIGTERM handler, which `main`
//! installs before any backend is opened. An interrupt therefore never kills
//! the process with pins still exported; commands see the cleared flag and
//! return through `close`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod list;
mod read;
mod sample;

pub use list::list_backends;
pub use read::run_read;
pub use sample::run_sample;

/// Clear `running` on SIGINT/SIGTERM instead of terminating
pub fn install_stop_handler(running: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        log::info!("Interrupted, releasing pins...");
        running.store(false, Ordering::SeqCst);
    })
}
