// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Deterministic RNG for host tests
//!
//! xorshift64* seeded at construction. Not a source of secrets.

use crate::error::{HalError, HalResult};
use crate::traits::RngInterface;

/// Simulated RNG
pub struct SimRng {
    state: u64,
    initialized: bool,
    failing: bool,
}

impl SimRng {
    /// Create an RNG with the given seed (zero is replaced by a fixed constant)
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
            initialized: false,
            failing: false,
        }
    }

    /// Make every subsequent `fill_bytes` fail
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    fn next_word(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl RngInterface for SimRng {
    fn init(&mut self) -> HalResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()> {
        if !self.initialized {
            return Err(HalError::NotInitialized);
        }
        if self.failing {
            return Err(HalError::RngError);
        }
        for chunk in buffer.chunks_mut(8) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.initialized
    }
}
