//! Coroutine runtime settings read from the environment.
//!
//! `FRONTGATE_STACK_SIZE` sets the stack of every connection coroutine, in
//! decimal (`65536`) or hex (`0x10000`). Applications run on that stack, so
//! deep framework call chains need more than the default.

use std::env;

/// Stack size used when `FRONTGATE_STACK_SIZE` is unset or invalid
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Coroutine stack size in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("FRONTGATE_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }

    /// Apply to the global `may` configuration. Call before starting the server.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    };
    parsed.filter(|n| *n > 0)
}
