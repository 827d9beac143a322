//! This module provides a built-in logger implementation.
//!
//! The built-in logger implementation uses the `env_logger` crate. It is
//! enabled by the Cargo feature `"builtin_env_logger"`, which is enabled
//! by default. When enabled it shows logs of level INFO or lower (the
//! lower, the more important).
//!
//! Bindings that want to integrate with their own host's logging
//! framework can disable the `"builtin_env_logger"` feature and register
//! their own implementation with the `log` crate instead.

/// Attempts to init an `env_logger`. Does nothing if the
/// `"builtin_env_logger"` feature is disabled.
pub fn try_init() {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            let result = env_logger::try_init_from_env(
                env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
            );

            match result {
                Ok(()) => {
                    log::debug!("layerfs initialized the logger.");
                }
                Err(e) => {
                    log::debug!("layerfs failed to initialize the built-in env_logger: {e}");
                }
            }
        } else {
            log::debug!("layerfs didn't initialize the built-in env_logger. The Cargo feature \"builtin_env_logger\" is not enabled.");
        }
    }
}
