use std::sync::OnceLock;

use gb_wire::DEFAULT_CAPACITY;

/// Smallest buffer that can hold a record header and one operand.
const MIN_CAPACITY: usize = 64;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

fn usize_from_env(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}

pub fn debug_mode() -> bool {
    static DEBUG: OnceLock<bool> = OnceLock::new();
    *DEBUG.get_or_init(|| bool_from_env("GOBRIDGE_DEBUG"))
}

pub fn buffer_size_override() -> Option<usize> {
    static SIZE: OnceLock<Option<usize>> = OnceLock::new();
    *SIZE.get_or_init(|| usize_from_env("GOBRIDGE_BUFFER_SIZE"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Upper bound of one encoded record.
    pub buffer_capacity: usize,
    pub debug: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            debug: false,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by `GOBRIDGE_BUFFER_SIZE` and `GOBRIDGE_DEBUG`.
    pub fn from_env() -> Self {
        Self::default()
            .with_buffer_capacity(buffer_size_override().unwrap_or(DEFAULT_CAPACITY))
            .with_debug(debug_mode())
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug |= debug;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(MIN_CAPACITY);
        self
    }
}
