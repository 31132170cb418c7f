// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! AES-CTR codec
//!
//! The counter block is the 12-byte nonce followed by a big-endian 32-bit
//! counter starting at 1. The peripheral increments the counter; the same
//! call encrypts and decrypts.

use lock_api::RawMutex;
use q_common::constants::{AES_IV_SIZE, CTR_INITIAL_COUNTER, CTR_NONCE_SIZE};
use q_common::log::MODULE_AES;
use q_common::log_error;
use q_hal::{AesPeripheral, ChainingMode, OperatingMode};

use crate::driver::BlockCipherDriver;
use crate::engine::CryptoEngine;
use crate::error::{CryptoError, CryptoResult};
use crate::zeroize_utils::secure_zero;

/// Build the initial counter block from a 12-byte nonce
#[must_use]
pub fn counter_block(nonce: &[u8; CTR_NONCE_SIZE], counter: u32) -> [u8; AES_IV_SIZE] {
    let mut block = [0u8; AES_IV_SIZE];
    block[..CTR_NONCE_SIZE].copy_from_slice(nonce);
    block[CTR_NONCE_SIZE..].copy_from_slice(&counter.to_be_bytes());
    block
}

impl<P: AesPeripheral, L, M: RawMutex> CryptoEngine<P, L, M> {
    /// Encrypt or decrypt `input` into `output` with AES-CTR
    ///
    /// `input` may be any length. Only the first `input.len()` bytes of
    /// `output` are written.
    ///
    /// # Errors
    /// `BufferTooSmall` if `output` is shorter than `input`; `Timeout` or
    /// `Hardware` if the peripheral fails, in which case the output is
    /// zeroed.
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes.
    pub fn ctr(
        &self,
        key: &[u8],
        nonce: &[u8; CTR_NONCE_SIZE],
        input: &[u8],
        output: &mut [u8],
    ) -> CryptoResult<()> {
        let output = output
            .get_mut(..input.len())
            .ok_or(CryptoError::BufferTooSmall)?;

        let mut iv = counter_block(nonce, CTR_INITIAL_COUNTER);
        let mut handle = self.load_swapped(key, &iv, ChainingMode::Ctr);
        secure_zero(&mut iv);

        let result = ctr_payload(handle.driver_mut(), input, output);
        handle.unload();

        if let Err(e) = result {
            secure_zero(output);
            log_error!(self, self.ticks(), MODULE_AES, "CTR failed: {}", e);
        }
        result
    }
}

fn ctr_payload<P: AesPeripheral>(
    driver: &mut BlockCipherDriver<P>,
    input: &[u8],
    output: &mut [u8],
) -> CryptoResult<()> {
    driver.enable();
    driver.set_operating_mode(OperatingMode::Encrypt);
    let result = driver.process_stream(input, output);
    driver.disable();
    result
}
