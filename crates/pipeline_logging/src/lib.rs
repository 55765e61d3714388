#![deny(missing_docs)]
//! Shared logging utilities for the Hyperknow workspace.
//!
//! This crate provides the `pipeline_*` logging macros used across the
//! codebase, a thread-local conversation context for log lines, and a
//! minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Thread-local storage for the conversation currently being worked on.
    static LOG_CONVERSATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the conversation id attached to subsequent log lines on this thread.
/// Pass `None` when no conversation is active.
pub fn set_log_conversation(conversation_id: Option<&str>) {
    LOG_CONVERSATION.with(|v| *v.borrow_mut() = conversation_id.map(ToOwned::to_owned));
}

/// Retrieves the conversation id for the current thread, or `"-"` if unset.
pub fn log_conversation() -> String {
    LOG_CONVERSATION.with(|v| v.borrow().clone().unwrap_or_else(|| "-".to_string()))
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{log_conversation, set_log_conversation};

    #[test]
    fn conversation_context_defaults_to_dash() {
        set_log_conversation(None);
        assert_eq!(log_conversation(), "-");
    }

    #[test]
    fn conversation_context_round_trips() {
        set_log_conversation(Some("abc123"));
        assert_eq!(log_conversation(), "abc123");
        set_log_conversation(None);
        assert_eq!(log_conversation(), "-");
    }
}
