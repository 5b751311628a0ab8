use std::{
    thread,
    time::{Duration, Instant},
};

use jeriya_shared::log::LevelFilter;
use simple_logger::SimpleLogger;

pub use spectral;

/// Installs a logger that prints everything to stdout.
///
/// Every test calls this, so initializing the logger a second time is silently ignored.
pub fn setup_logger() {
    let _ = SimpleLogger::new().with_level(LevelFilter::Trace).init();
}

/// Calls `condition` until it returns `true` and panics when `timeout` is exceeded.
///
/// Sleeps a millisecond between the attempts so that the test doesn't starve the
/// threads it is waiting for.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        if start.elapsed() > timeout {
            panic!("condition was not met within {timeout:?}");
        }
        thread::sleep(Duration::from_millis(1));
    }
}
