// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Crypto engine configuration
//!
//! All configuration is compile-time. The engine copies the struct at
//! construction; there is no runtime reconfiguration.

use crate::constants::AES_WAIT_TIMEOUT_CYCLES;
use crate::log::LogLevel;

/// Tick source used to timestamp log entries
pub type TickSource = fn() -> u32;

const fn zero_ticks() -> u32 {
    0
}

/// Configuration for the AES engine and key enclave
#[derive(Debug, Clone, Copy)]
pub struct CryptoEngineConfig {
    /// Polling budget for each peripheral completion wait
    pub wait_timeout_cycles: u32,
    /// Minimum level recorded in the engine log buffer
    pub log_level: LogLevel,
    /// Timestamp source for log entries
    pub tick_source: TickSource,
}

impl CryptoEngineConfig {
    /// Default configuration (~1 ms waits, info logging, no clock)
    pub const DEFAULT: Self = Self {
        wait_timeout_cycles: AES_WAIT_TIMEOUT_CYCLES,
        log_level: LogLevel::Info,
        tick_source: zero_ticks,
    };

    /// Override the completion wait budget
    #[must_use]
    pub const fn with_wait_timeout(mut self, cycles: u32) -> Self {
        self.wait_timeout_cycles = cycles;
        self
    }

    /// Override the minimum log level
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Override the tick source
    #[must_use]
    pub const fn with_tick_source(mut self, source: TickSource) -> Self {
        self.tick_source = source;
        self
    }
}

impl Default for CryptoEngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
