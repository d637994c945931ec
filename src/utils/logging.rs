//! Logger setup plus gated logging macros.
//!
//! The tracking loop and dwell buttons log on every transition, which is
//! noisy at `info`. Those modules declare a local flag and log through the
//! macros below so they can be silenced without touching `RUST_LOG`:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("dwell started on {}", id);
//! ```

use log::LevelFilter;

/// Forces debug output regardless of `RUST_LOG`.
pub const DEBUG_ENV: &str = "VOCABLE_DEBUG";

/// Installs `env_logger`. `RUST_LOG` is respected and the level defaults to
/// `info`; setting `VOCABLE_DEBUG` to anything but `0` raises it to `debug`.
///
/// Safe to call more than once. Later calls are ignored.
pub fn init_logging() {
    let level = if debug_requested(std::env::var(DEBUG_ENV).ok().as_deref()) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

fn debug_requested(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

/// `log::info!` gated on the caller's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` gated on the caller's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::error!` gated on the caller's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
