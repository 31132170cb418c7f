// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! STM32WB True Random Number Generator Driver
//!
//! Supplies key material for lazily generated enclave slots. The RNG
//! kernel clock (CLK48 or LSE) must be configured by the clock tree setup
//! before `init`.

use super::addresses::{RCC_BASE, RNG_BASE};
use super::registers::{modify_reg, read_reg, write_reg};
use crate::error::{HalError, HalResult};
use crate::traits::RngInterface;

const RCC_AHB3ENR: u32 = RCC_BASE + 0x50;
const RCC_AHB3ENR_RNGEN: u32 = 1 << 18;

const RNG_CR: u32 = RNG_BASE + 0x00;
const RNG_SR: u32 = RNG_BASE + 0x04;
const RNG_DR: u32 = RNG_BASE + 0x08;

const RNG_CR_RNGEN: u32 = 1 << 2;
const RNG_SR_DRDY: u32 = 1 << 0;
const RNG_SR_CECS: u32 = 1 << 1;
const RNG_SR_SECS: u32 = 1 << 2;

const RNG_TIMEOUT: u32 = 100_000;

/// STM32WB RNG driver
pub struct Stm32wbRng {
    initialized: bool,
}

impl Stm32wbRng {
    /// Create a new RNG driver instance
    #[must_use]
    pub const fn new() -> Self {
        Self { initialized: false }
    }

    fn wait_data_ready() -> HalResult<()> {
        let mut timeout = RNG_TIMEOUT;
        loop {
            // SAFETY: RNG_SR is a read-only status register.
            let sr = unsafe { read_reg(RNG_SR) };

            if sr & (RNG_SR_SECS | RNG_SR_CECS) != 0 {
                return Err(HalError::RngError);
            }
            if sr & RNG_SR_DRDY != 0 {
                return Ok(());
            }

            timeout = timeout.saturating_sub(1);
            if timeout == 0 {
                return Err(HalError::Timeout);
            }
            core::hint::spin_loop();
        }
    }
}

impl RngInterface for Stm32wbRng {
    fn init(&mut self) -> HalResult<()> {
        // SAFETY: RCC_AHB3ENR and RNG_CR are architecturally-defined STM32WB registers.
        // Enables the RNG bus clock, then the generator itself.
        unsafe {
            modify_reg(RCC_AHB3ENR, |v| v | RCC_AHB3ENR_RNGEN);
            write_reg(RNG_CR, RNG_CR_RNGEN);
        }

        Self::wait_data_ready().map_err(|_| HalError::InitFailed)?;

        self.initialized = true;
        Ok(())
    }

    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()> {
        if !self.initialized {
            return Err(HalError::NotInitialized);
        }

        for chunk in buffer.chunks_mut(4) {
            Self::wait_data_ready()?;
            // SAFETY: RNG_DR holds a fresh 32-bit sample once DRDY is set.
            let word = unsafe { read_reg(RNG_DR) };
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }

        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.initialized
    }
}

impl Default for Stm32wbRng {
    fn default() -> Self {
        Self::new()
    }
}
