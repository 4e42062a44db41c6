//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! The capture and signal modules log every provider call, which gets noisy
//! once the pipeline runs in a loop. Each of those modules declares
//! `const ENABLE_LOGS: bool` and uses these macros so its output can be
//! silenced without touching the global `RUST_LOG` filter.
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("camera ready");
//! ```

/// Conditional `log::info!`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional `log::warn!`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional `log::error!`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Conditional `log::debug!`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Initialise `env_logger` at `Info`, or `Debug` when `LIVENESS_DEBUG` is set.
/// `RUST_LOG` still wins when present.
pub fn init() {
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    // Tests and embedding hosts may have installed a logger already.
    let _ = builder.try_init();
}

pub fn debug_enabled() -> bool {
    std::env::var("LIVENESS_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
