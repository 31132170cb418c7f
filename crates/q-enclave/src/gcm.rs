// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! AES-GCM codec
//!
//! Drives the peripheral's four GCM phases:
//!
//! 1. **Init**: hash subkey computation, no data
//! 2. **Header**: AAD blocks pushed without reading (skipped for empty AAD)
//! 3. **Payload**: counter-mode blocks, GHASH over the ciphertext
//! 4. **Final**: the length block; the output is the tag
//!
//! The initial counter block is `iv || BE32(2)`; counter 1 is J0, used by
//! the peripheral for the tag.
//!
//! [`GcmContext`] enforces the phase order and keeps the AAD and payload
//! byte counts for the length block.

use lock_api::RawMutex;
use q_common::constants::{
    AES_BLOCK_SIZE, AES_GCM_NONCE_SIZE, AES_GCM_TAG_SIZE, GCM_INITIAL_COUNTER,
};
use q_common::log::MODULE_AES;
use q_common::{log_error, log_warn};
use q_hal::{AesPeripheral, ChainingMode, GcmPhase, OperatingMode};

use crate::ctr::counter_block;
use crate::driver::BlockCipherDriver;
use crate::engine::CryptoEngine;
use crate::error::{CryptoError, CryptoResult};
use crate::zeroize_utils::{constant_time_compare, secure_zero};

/// Direction of a GCM run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcmDirection {
    /// Encrypt and produce a tag
    Encrypt,
    /// Decrypt and recompute the tag
    Decrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Init,
    Header,
    Payload,
    Done,
}

/// GCM phase machine for one run
#[derive(Debug)]
pub struct GcmContext {
    direction: GcmDirection,
    stage: Stage,
    aad_len: u64,
    payload_len: u64,
}

impl GcmContext {
    /// New context, before the Init phase
    #[must_use]
    pub const fn new(direction: GcmDirection) -> Self {
        Self {
            direction,
            stage: Stage::Idle,
            aad_len: 0,
            payload_len: 0,
        }
    }

    /// Direction of this run
    #[must_use]
    pub const fn direction(&self) -> GcmDirection {
        self.direction
    }

    /// AAD bytes absorbed so far
    #[must_use]
    pub const fn aad_len(&self) -> u64 {
        self.aad_len
    }

    /// Payload bytes processed so far
    #[must_use]
    pub const fn payload_len(&self) -> u64 {
        self.payload_len
    }

    /// The tag has been produced
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    fn require_stage(&self, allowed: &[Stage]) -> CryptoResult<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(CryptoError::InvalidState)
        }
    }

    /// Init phase: compute the hash subkey
    ///
    /// # Errors
    /// `InvalidState` unless this is the first phase of the run; `Timeout`
    /// if the peripheral does not complete.
    pub fn init<P: AesPeripheral>(
        &mut self,
        driver: &mut BlockCipherDriver<P>,
    ) -> CryptoResult<()> {
        self.require_stage(&[Stage::Idle])?;

        driver.set_phase(GcmPhase::Init);
        driver.set_operating_mode(match self.direction {
            GcmDirection::Encrypt => OperatingMode::Encrypt,
            GcmDirection::Decrypt => OperatingMode::Decrypt,
        });
        driver.run_setup_cycle()?;

        self.stage = Stage::Init;
        Ok(())
    }

    /// Header phase: absorb `aad`
    ///
    /// Empty AAD leaves the peripheral untouched.
    ///
    /// # Errors
    /// `InvalidState` unless called once, directly after `init`.
    pub fn header<P: AesPeripheral>(
        &mut self,
        driver: &mut BlockCipherDriver<P>,
        aad: &[u8],
    ) -> CryptoResult<()> {
        self.require_stage(&[Stage::Init])?;
        self.stage = Stage::Header;
        if aad.is_empty() {
            return Ok(());
        }

        driver.set_phase(GcmPhase::Header);
        driver.enable();

        let result = absorb(driver, aad);
        if result.is_err() {
            driver.disable();
        }
        result?;

        self.aad_len = aad.len() as u64;
        Ok(())
    }

    /// Payload phase: transform `input` into `output`
    ///
    /// On encrypt the padding count of a final partial block is programmed
    /// so the padding stays out of the tag.
    ///
    /// # Errors
    /// `InvalidState` unless called once, after `init` or `header`;
    /// `BufferTooSmall` if `output` is shorter than `input`.
    pub fn payload<P: AesPeripheral>(
        &mut self,
        driver: &mut BlockCipherDriver<P>,
        input: &[u8],
        output: &mut [u8],
    ) -> CryptoResult<()> {
        self.require_stage(&[Stage::Init, Stage::Header])?;
        if output.len() < input.len() {
            return Err(CryptoError::BufferTooSmall);
        }
        self.stage = Stage::Payload;

        driver.set_phase(GcmPhase::Payload);
        driver.enable();

        let full = input.len() - input.len() % AES_BLOCK_SIZE;
        let mut result = driver.process_blocks(&input[..full], &mut output[..full]);
        if result.is_ok() && full < input.len() {
            if self.direction == GcmDirection::Encrypt {
                driver.set_padding((AES_BLOCK_SIZE - (input.len() - full)) as u8);
            }
            result = driver.process_partial(&input[full..], &mut output[full..input.len()]);
        }
        if result.is_err() {
            driver.disable();
        }
        result?;

        self.payload_len = input.len() as u64;
        Ok(())
    }

    /// Final phase: push the length block and read the tag
    ///
    /// # Errors
    /// `InvalidState` unless called after `payload`.
    pub fn finish<P: AesPeripheral>(
        &mut self,
        driver: &mut BlockCipherDriver<P>,
    ) -> CryptoResult<[u8; AES_GCM_TAG_SIZE]> {
        self.require_stage(&[Stage::Payload])?;

        driver.set_phase(GcmPhase::Final);
        let result = driver.process_block(&length_block(self.aad_len, self.payload_len));
        if result.is_err() {
            driver.disable();
        }
        let tag = result?;

        self.stage = Stage::Done;
        Ok(tag)
    }
}

fn absorb<P: AesPeripheral>(driver: &mut BlockCipherDriver<P>, data: &[u8]) -> CryptoResult<()> {
    let mut chunks = data.chunks_exact(AES_BLOCK_SIZE);
    for chunk in &mut chunks {
        let mut block = [0u8; AES_BLOCK_SIZE];
        block.copy_from_slice(chunk);
        driver.absorb_block(&block)?;
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        driver.absorb_partial(rest)?;
    }
    Ok(())
}

/// GHASH length block: bit lengths of AAD and payload, 64-bit big endian
fn length_block(aad_len: u64, payload_len: u64) -> [u8; AES_BLOCK_SIZE] {
    let mut block = [0u8; AES_BLOCK_SIZE];
    block[..8].copy_from_slice(&aad_len.wrapping_mul(8).to_be_bytes());
    block[8..].copy_from_slice(&payload_len.wrapping_mul(8).to_be_bytes());
    block
}

impl<P: AesPeripheral, L, M: RawMutex> CryptoEngine<P, L, M> {
    fn gcm_run(
        &self,
        key: &[u8],
        iv: &[u8; AES_GCM_NONCE_SIZE],
        aad: &[u8],
        input: &[u8],
        output: &mut [u8],
        direction: GcmDirection,
    ) -> CryptoResult<[u8; AES_GCM_TAG_SIZE]> {
        let mut counter = counter_block(iv, GCM_INITIAL_COUNTER);
        let mut handle = self.load_swapped(key, &counter, ChainingMode::Gcm);
        secure_zero(&mut counter);

        let driver = handle.driver_mut();
        let mut ctx = GcmContext::new(direction);
        ctx.init(driver)?;
        if !aad.is_empty() {
            ctx.header(driver, aad)?;
        }
        ctx.payload(driver, input, output)?;
        ctx.finish(driver)
    }

    /// Encrypt `input` into `output` and return the tag
    ///
    /// # Errors
    /// `BufferTooSmall` if `output` is shorter than `input`; `Timeout` or
    /// `Hardware` on peripheral failure, in which case output is zeroed.
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes.
    pub fn gcm_encrypt_and_tag(
        &self,
        key: &[u8],
        iv: &[u8; AES_GCM_NONCE_SIZE],
        aad: &[u8],
        input: &[u8],
        output: &mut [u8],
    ) -> CryptoResult<[u8; AES_GCM_TAG_SIZE]> {
        let output = output
            .get_mut(..input.len())
            .ok_or(CryptoError::BufferTooSmall)?;

        match self.gcm_run(key, iv, aad, input, output, GcmDirection::Encrypt) {
            Ok(tag) => Ok(tag),
            Err(e) => {
                secure_zero(output);
                log_error!(self, self.ticks(), MODULE_AES, "GCM encrypt failed: {}", e);
                Err(e)
            }
        }
    }

    /// Decrypt `input` into `output` and check `tag`
    ///
    /// The output is released only if the tag matches.
    ///
    /// # Errors
    /// `AuthFailure` on tag mismatch, `BufferTooSmall`, `Timeout` or
    /// `Hardware`. Output is zeroed on every error.
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes.
    pub fn gcm_decrypt_and_verify(
        &self,
        key: &[u8],
        iv: &[u8; AES_GCM_NONCE_SIZE],
        aad: &[u8],
        input: &[u8],
        output: &mut [u8],
        tag: &[u8; AES_GCM_TAG_SIZE],
    ) -> CryptoResult<()> {
        let output = output
            .get_mut(..input.len())
            .ok_or(CryptoError::BufferTooSmall)?;

        let mut computed = match self.gcm_run(key, iv, aad, input, output, GcmDirection::Decrypt) {
            Ok(computed) => computed,
            Err(e) => {
                secure_zero(output);
                log_error!(self, self.ticks(), MODULE_AES, "GCM decrypt failed: {}", e);
                return Err(e);
            }
        };

        let authentic = constant_time_compare(&computed, tag);
        secure_zero(&mut computed);
        if !authentic {
            secure_zero(output);
            log_warn!(self, self.ticks(), MODULE_AES, "GCM tag mismatch");
            return Err(CryptoError::AuthFailure);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_block() {
        let block = length_block(20, 60);
        assert_eq!(&block[..8], &160u64.to_be_bytes());
        assert_eq!(&block[8..], &480u64.to_be_bytes());
        assert_eq!(length_block(0, 0), [0u8; 16]);
    }

    #[test]
    fn test_context_starts_idle() {
        let ctx = GcmContext::new(GcmDirection::Decrypt);
        assert_eq!(ctx.direction(), GcmDirection::Decrypt);
        assert_eq!(ctx.aad_len(), 0);
        assert_eq!(ctx.payload_len(), 0);
        assert!(!ctx.is_finished());
    }

    #[test]
    fn test_phase_order_checks() {
        let mut ctx = GcmContext::new(GcmDirection::Encrypt);
        assert_eq!(ctx.require_stage(&[Stage::Payload]), Err(CryptoError::InvalidState));
        ctx.stage = Stage::Header;
        assert!(ctx.require_stage(&[Stage::Init, Stage::Header]).is_ok());
        ctx.stage = Stage::Done;
        assert_eq!(ctx.require_stage(&[Stage::Payload]), Err(CryptoError::InvalidState));
    }
}
