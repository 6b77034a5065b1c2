#![deny(missing_docs)]
//! Shared logging utilities for the converter workspace.
//!
//! This crate provides the `converter_*` logging macros used across the
//! codebase and a minimal test initializer for the global logger. Lines logged
//! on a thread that called [`set_attempt`] are prefixed with that attempt, so
//! the app's message loop tags everything it logs for a run. Engine runtime
//! threads never set it and name the attempt in the message instead.

use std::cell::Cell;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Thread-local storage for the conversion attempt being processed.
    static ATTEMPT: Cell<u64> = const { Cell::new(0) };
}

/// Sets the conversion attempt id for the current thread.
/// Zero means "no attempt" and suppresses the prefix.
pub fn set_attempt(attempt: u64) {
    ATTEMPT.with(|v| v.set(attempt));
}

/// Retrieves the conversion attempt id for the current thread.
/// Returns 0 if no attempt has been set.
pub fn current_attempt() -> u64 {
    ATTEMPT.with(|v| v.get())
}

/// Builds the line prefix for the current thread's attempt.
#[doc(hidden)]
pub fn __prefix() -> String {
    match current_attempt() {
        0 => String::new(),
        attempt => format!("[attempt {attempt}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! converter_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::__prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! converter_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::__prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! converter_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::__prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! converter_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::__prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! converter_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::__prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
