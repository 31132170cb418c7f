// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware Abstraction Layer for the Qbitel crypto engine
//!
//! This crate provides the hardware seams the AES engine and key enclave
//! are written against:
//!
//! - **STM32WB**: AES1 register driver and TRNG (feature `stm32wb`)
//! - **Simulator**: software AES peripheral, co-processor and RNG for host
//!   testing (feature `sim`)
//!
//! # Architecture
//!
//! 1. **Traits**: `AesPeripheral`, `CoprocessorLink`, `RngInterface`
//! 2. **Drivers**: platform register implementations
//! 3. **Simulator**: behavioural models with fault injection
//!
//! # Security
//!
//! - Key registers are written once per session and cleared on unload
//! - Enclave keys never cross the co-processor boundary

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "sim")]
extern crate std;

pub mod traits;
pub mod error;

#[cfg(feature = "stm32wb")]
pub mod stm32wb;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export main traits
pub use traits::*;
pub use error::{HalError, HalResult};

/// Platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// STM32WB (Cortex-M4 with Cortex-M0+ radio co-processor)
    Stm32Wb,
    /// Host simulator
    Simulator,
    /// Unknown platform
    Unknown,
}

impl Platform {
    /// Get the current platform
    #[must_use]
    pub const fn current() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "stm32wb")] {
                Self::Stm32Wb
            } else if #[cfg(feature = "sim")] {
                Self::Simulator
            } else {
                Self::Unknown
            }
        }
    }

    /// Check if a secure co-processor holds the key slots
    #[must_use]
    pub const fn has_coprocessor(&self) -> bool {
        matches!(self, Self::Stm32Wb | Self::Simulator)
    }

    /// Get the AES peripheral base address for this platform
    #[must_use]
    pub const fn aes_base(&self) -> u32 {
        match self {
            Self::Stm32Wb => 0x5006_0000,
            Self::Simulator | Self::Unknown => 0x0000_0000,
        }
    }
}
