// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! STM32WB AES1 Hardware Accelerator Driver
//!
//! Register-level implementation of [`AesPeripheral`] for the AES1
//! instance. AES2 is reserved for the radio co-processor.
//!
//! # Reference
//! STM32WB55 Reference Manual RM0434, Section 23: AES hardware accelerator
//!
//! # Security
//!
//! - DMA and interrupts are never enabled; all transfers are CPU-driven
//! - Key registers are written only while the peripheral is disabled

use cortex_m::peripheral::{DCB, DWT};

use super::addresses::{AES1_BASE, RCC_BASE};
use super::registers::{modify_reg, read_reg, write_reg};
use crate::error::HalResult;
use crate::traits::{wait_cycles, AesControl, AesPeripheral, ChainingMode, GcmPhase, OperatingMode};
use q_common::KeySize;

// ============================================================================
// AES1 Register Definitions (RM0434 Section 23.7)
// ============================================================================

const AES_CR: u32 = AES1_BASE + 0x00;      // Control register
const AES_SR: u32 = AES1_BASE + 0x04;      // Status register
const AES_DINR: u32 = AES1_BASE + 0x08;    // Data input register
const AES_DOUTR: u32 = AES1_BASE + 0x0C;   // Data output register
const AES_KEYR0: u32 = AES1_BASE + 0x10;   // Key register 0 (LSW)
const AES_IVR0: u32 = AES1_BASE + 0x20;    // IV register 0 (LSW)
const AES_KEYR4: u32 = AES1_BASE + 0x30;   // Key register 4

// AES_CR bit definitions
const CR_EN: u32 = 1 << 0;
const CR_DATATYPE_MASK: u32 = 0x3 << 1;
const CR_MODE_POS: u32 = 3;
const CR_MODE_MASK: u32 = 0x3 << CR_MODE_POS;
const CR_CHMOD_POS: u32 = 5;
const CR_CHMOD_MASK: u32 = 0x3 << CR_CHMOD_POS;
const CR_CCFC: u32 = 1 << 7;
const CR_ERRC: u32 = 1 << 8;
const CR_CCFIE: u32 = 1 << 9;
const CR_ERRIE: u32 = 1 << 10;
const CR_DMAINEN: u32 = 1 << 11;
const CR_DMAOUTEN: u32 = 1 << 12;
const CR_GCMPH_POS: u32 = 13;
const CR_GCMPH_MASK: u32 = 0x3 << CR_GCMPH_POS;
const CR_CHMOD2: u32 = 1 << 16;
const CR_KEYSIZE: u32 = 1 << 18;
const CR_NPBLB_POS: u32 = 20;
const CR_NPBLB_MASK: u32 = 0xF << CR_NPBLB_POS;

const CR_CONFIG_MASK: u32 = CR_DATATYPE_MASK
    | CR_MODE_MASK
    | CR_CHMOD_MASK
    | CR_CCFIE
    | CR_ERRIE
    | CR_DMAINEN
    | CR_DMAOUTEN
    | CR_GCMPH_MASK
    | CR_CHMOD2
    | CR_KEYSIZE
    | CR_NPBLB_MASK;

// AES_SR bit definitions
const SR_CCF: u32 = 1 << 0;
const SR_RDERR: u32 = 1 << 1;
const SR_WRERR: u32 = 1 << 2;

// RCC
const RCC_AHB2ENR: u32 = RCC_BASE + 0x4C;
const RCC_AHB2ENR_AES1EN: u32 = 1 << 16;

// ============================================================================
// Control word encoding
// ============================================================================

const fn encode(control: AesControl) -> u32 {
    let chmod = match control.chaining {
        ChainingMode::Ecb => 0,
        ChainingMode::Cbc => 1,
        ChainingMode::Ctr => 2,
        ChainingMode::Gcm => 3,
    };
    let mode = match control.mode {
        OperatingMode::Encrypt => 0,
        OperatingMode::KeyDerivation => 1,
        OperatingMode::Decrypt => 2,
    };
    let phase = match control.phase {
        GcmPhase::Init => 0,
        GcmPhase::Header => 1,
        GcmPhase::Payload => 2,
        GcmPhase::Final => 3,
    };
    let keysize = match control.key_size {
        KeySize::Aes128 => 0,
        KeySize::Aes256 => CR_KEYSIZE,
    };

    // DATATYPE stays 0 (32-bit words, no swapping)
    (chmod << CR_CHMOD_POS)
        | (mode << CR_MODE_POS)
        | (phase << CR_GCMPH_POS)
        | keysize
        | (((control.padding_bytes & 0xF) as u32) << CR_NPBLB_POS)
}

const fn decode(cr: u32) -> AesControl {
    let chaining = match (cr & CR_CHMOD_MASK) >> CR_CHMOD_POS {
        0 => ChainingMode::Ecb,
        1 => ChainingMode::Cbc,
        2 => ChainingMode::Ctr,
        _ => ChainingMode::Gcm,
    };
    let mode = match (cr & CR_MODE_MASK) >> CR_MODE_POS {
        0 => OperatingMode::Encrypt,
        1 => OperatingMode::KeyDerivation,
        // MODE=3 (derive then decrypt) is never programmed
        _ => OperatingMode::Decrypt,
    };
    let phase = match (cr & CR_GCMPH_MASK) >> CR_GCMPH_POS {
        0 => GcmPhase::Init,
        1 => GcmPhase::Header,
        2 => GcmPhase::Payload,
        _ => GcmPhase::Final,
    };
    let key_size = if cr & CR_KEYSIZE != 0 {
        KeySize::Aes256
    } else {
        KeySize::Aes128
    };

    AesControl {
        chaining,
        mode,
        key_size,
        phase,
        padding_bytes: ((cr & CR_NPBLB_MASK) >> CR_NPBLB_POS) as u8,
    }
}

// ============================================================================
// AES1 Driver
// ============================================================================

/// STM32WB AES1 peripheral
pub struct Stm32wbAes {
    _private: (),
}

impl Stm32wbAes {
    /// Take the AES1 peripheral
    ///
    /// # Safety
    /// Only one instance may exist; the AES1 registers must not be touched
    /// by any other code while it is alive.
    #[must_use]
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

/// Start the DWT cycle counter that bounds AES completion waits
///
/// Must run once at startup, before the first operation. With the counter
/// stopped every wait reports `Timeout` after the first poll.
pub fn start_cycle_counter(dcb: &mut DCB, dwt: &mut DWT) {
    dcb.enable_trace();
    dwt.enable_cycle_counter();
}

impl AesPeripheral for Stm32wbAes {
    fn enable_clock(&mut self) {
        // SAFETY: RCC_AHB2ENR is an architecturally-defined STM32WB register.
        // Read-modify-write sets only the AES1 clock enable bit.
        unsafe {
            modify_reg(RCC_AHB2ENR, |v| v | RCC_AHB2ENR_AES1EN);
            // Read back so the clock is running before the next AES access
            let _ = read_reg(RCC_AHB2ENR);
        }
    }

    fn disable_clock(&mut self) {
        // SAFETY: RCC_AHB2ENR is an architecturally-defined STM32WB register.
        // Read-modify-write clears only the AES1 clock enable bit.
        unsafe {
            modify_reg(RCC_AHB2ENR, |v| v & !RCC_AHB2ENR_AES1EN);
        }
    }

    fn set_mode(&mut self, control: AesControl) {
        // SAFETY: AES_CR is an architecturally-defined AES1 register.
        // Only configuration fields are replaced; EN is preserved.
        unsafe {
            modify_reg(AES_CR, |v| (v & !CR_CONFIG_MASK) | encode(control));
        }
    }

    fn control(&self) -> AesControl {
        // SAFETY: AES_CR is an architecturally-defined AES1 register; reading has no side effects.
        decode(unsafe { read_reg(AES_CR) })
    }

    fn set_enabled(&mut self, enabled: bool) {
        // SAFETY: AES_CR is an architecturally-defined AES1 register.
        // Read-modify-write toggles only the EN bit.
        unsafe {
            modify_reg(AES_CR, |v| if enabled { v | CR_EN } else { v & !CR_EN });
        }
    }

    fn is_enabled(&self) -> bool {
        // SAFETY: AES_CR is an architecturally-defined AES1 register; reading has no side effects.
        unsafe { read_reg(AES_CR) & CR_EN != 0 }
    }

    fn write_key(&mut self, words: &[u32]) {
        // KEYR7..KEYR4 at 0x3C..0x30, KEYR3..KEYR0 at 0x1C..0x10
        let count = words.len().min(8);
        for (i, word) in words.iter().take(count).enumerate() {
            let index = (count - 1 - i) as u32;
            let addr = if index >= 4 {
                AES_KEYR4 + (index - 4) * 4
            } else {
                AES_KEYR0 + index * 4
            };
            // SAFETY: addr is one of the KEYR0..KEYR7 registers computed above.
            // The peripheral is disabled while keys are written.
            unsafe {
                write_reg(addr, *word);
            }
        }
    }

    fn write_iv(&mut self, words: &[u32; 4]) {
        for (i, word) in words.iter().enumerate() {
            // SAFETY: IVR3..IVR0 are architecturally-defined AES1 registers.
            unsafe {
                write_reg(AES_IVR0 + (3 - i as u32) * 4, *word);
            }
        }
    }

    fn push_block(&mut self, words: &[u32; 4]) {
        for word in words {
            // SAFETY: AES_DINR is the AES1 data input FIFO; four consecutive
            // writes form one block.
            unsafe {
                write_reg(AES_DINR, *word);
            }
        }
    }

    fn pop_block(&mut self) -> [u32; 4] {
        let mut out = [0u32; 4];
        for word in &mut out {
            // SAFETY: AES_DOUTR is the AES1 data output FIFO; four consecutive
            // reads drain one block after CCF.
            *word = unsafe { read_reg(AES_DOUTR) };
        }
        out
    }

    fn is_ready(&self) -> bool {
        // SAFETY: AES_SR is a read-only status register.
        unsafe { read_reg(AES_SR) & SR_CCF != 0 }
    }

    fn clear_ready(&mut self) {
        // SAFETY: AES_CR is an architecturally-defined AES1 register.
        // CCFC is write-1-to-clear and reads back as zero.
        unsafe {
            modify_reg(AES_CR, |v| v | CR_CCFC);
        }
    }

    fn has_error(&self) -> bool {
        // SAFETY: AES_SR is a read-only status register.
        unsafe { read_reg(AES_SR) & (SR_RDERR | SR_WRERR) != 0 }
    }

    fn clear_error(&mut self) {
        // SAFETY: AES_CR is an architecturally-defined AES1 register.
        // ERRC is write-1-to-clear and reads back as zero.
        unsafe {
            modify_reg(AES_CR, |v| v | CR_ERRC);
        }
    }

    /// Poll for completion until `timeout_cycles` core clock cycles have
    /// passed on the DWT cycle counter
    fn wait_ready(&mut self, timeout_cycles: u32) -> HalResult<()> {
        wait_cycles(self, timeout_cycles, DWT::cycle_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_word_round_trips_through_register_layout() {
        let ctrl = AesControl::new(ChainingMode::Gcm, KeySize::Aes256)
            .with_mode(OperatingMode::Decrypt)
            .with_phase(GcmPhase::Payload)
            .with_padding(5);
        let cr = encode(ctrl);
        assert_eq!(cr & CR_EN, 0);
        assert_eq!((cr >> CR_CHMOD_POS) & 0x3, 3);
        assert_eq!((cr >> CR_MODE_POS) & 0x3, 2);
        assert_eq!((cr >> CR_GCMPH_POS) & 0x3, 2);
        assert_eq!((cr >> CR_NPBLB_POS) & 0xF, 5);
        assert_ne!(cr & CR_KEYSIZE, 0);
        assert_eq!(decode(cr), ctrl);
    }

    #[test]
    fn test_cbc_encrypt_256_encoding() {
        let cr = encode(AesControl::new(ChainingMode::Cbc, KeySize::Aes256));
        assert_eq!(cr, (1 << CR_CHMOD_POS) | CR_KEYSIZE);
    }
}
