// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! STM32WB Hardware Abstraction Layer
//!
//! Drivers for the STM32WB55 application core (Cortex-M4). The radio
//! co-processor (Cortex-M0+) owns the user key slots; its link is provided
//! by the wireless stack integration and plugged in through
//! [`crate::CoprocessorLink`].
//!
//! # Supported Features
//!
//! - AES1 hardware accelerator (ECB, CBC, CTR, GCM)
//! - True random number generator (TRNG)

pub mod aes;
pub mod rng;

pub use aes::{start_cycle_counter, Stm32wbAes};
pub use rng::Stm32wbRng;

/// Register access utilities
pub(crate) mod registers {
    use core::ptr::{read_volatile, write_volatile};

    /// Read a 32-bit register
    ///
    /// # Safety
    /// The address must be a valid memory-mapped register.
    #[inline]
    pub unsafe fn read_reg(addr: u32) -> u32 {
        read_volatile(addr as *const u32)
    }

    /// Write a 32-bit register
    ///
    /// # Safety
    /// The address must be a valid memory-mapped register.
    #[inline]
    pub unsafe fn write_reg(addr: u32, value: u32) {
        write_volatile(addr as *mut u32, value);
    }

    /// Modify a 32-bit register (read-modify-write)
    ///
    /// # Safety
    /// The address must be a valid memory-mapped register.
    #[inline]
    pub unsafe fn modify_reg<F>(addr: u32, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = read_reg(addr);
        write_reg(addr, f(value));
    }
}

/// Peripheral base addresses
pub mod addresses {
    /// AES1 base address (AHB2)
    pub const AES1_BASE: u32 = 0x5006_0000;
    /// RNG base address (AHB3)
    pub const RNG_BASE: u32 = 0x5806_0800;
    /// RCC base address
    pub const RCC_BASE: u32 = 0x5800_0000;
}
