// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Block cipher session driver
//!
//! Wraps an [`AesPeripheral`] for the duration of one load/unload session:
//! programs key and IV, runs the decrypt priming pass, and moves 16-byte
//! blocks through the data registers with a bounded completion wait.
//!
//! # Word Order
//!
//! The raw key path hands byte buffers to the peripheral as native
//! little-endian words. The CTR/GCM path byte-swaps every word so the
//! register view is big-endian, which is what the counter increment and
//! the GHASH input expect. The order is chosen per session at
//! [`BlockCipherDriver::configure`].

use q_common::constants::AES_BLOCK_SIZE;
use q_common::KeySize;
use q_hal::{AesControl, AesPeripheral, ChainingMode, GcmPhase, OperatingMode};

use crate::error::{CryptoError, CryptoResult};
use crate::zeroize_utils::{secure_zero, secure_zero_words};

/// One 16-byte AES block
pub type Block = [u8; AES_BLOCK_SIZE];

/// Byte order of each 32-bit word exchanged with the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    /// Words are read from memory as-is (little endian)
    Native,
    /// Every word is byte-swapped (big-endian register view)
    ByteSwapped,
}

impl WordOrder {
    /// Convert four bytes into one register word
    #[must_use]
    pub const fn word(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Native => u32::from_le_bytes(bytes),
            Self::ByteSwapped => u32::from_be_bytes(bytes),
        }
    }

    /// Convert one register word into four bytes
    #[must_use]
    pub const fn bytes(self, word: u32) -> [u8; 4] {
        match self {
            Self::Native => word.to_le_bytes(),
            Self::ByteSwapped => word.to_be_bytes(),
        }
    }

    /// Block to register words
    #[must_use]
    pub fn block_to_words(self, block: &Block) -> [u32; 4] {
        let mut words = [0u32; 4];
        for (w, c) in words.iter_mut().zip(block.chunks_exact(4)) {
            *w = self.word([c[0], c[1], c[2], c[3]]);
        }
        words
    }

    /// Register words to block
    #[must_use]
    pub fn words_to_block(self, words: &[u32; 4]) -> Block {
        let mut block = [0u8; AES_BLOCK_SIZE];
        for (c, w) in block.chunks_exact_mut(4).zip(words.iter()) {
            c.copy_from_slice(&self.bytes(*w));
        }
        block
    }
}

/// Session driver over one AES peripheral instance
pub struct BlockCipherDriver<P> {
    periph: P,
    timeout_cycles: u32,
    order: WordOrder,
    session_open: bool,
    decrypt_primed: bool,
}

impl<P: AesPeripheral> BlockCipherDriver<P> {
    /// Create a driver; `timeout_cycles` bounds every completion wait
    pub const fn new(periph: P, timeout_cycles: u32) -> Self {
        Self {
            periph,
            timeout_cycles,
            order: WordOrder::Native,
            session_open: false,
            decrypt_primed: false,
        }
    }

    /// Underlying peripheral
    pub fn peripheral(&self) -> &P {
        &self.periph
    }

    /// Underlying peripheral, mutably
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.periph
    }

    /// A session is open (clock ungated, key loaded or being loaded)
    pub const fn is_session_open(&self) -> bool {
        self.session_open
    }

    /// The decrypt priming pass has run in this session
    pub const fn is_decrypt_primed(&self) -> bool {
        self.decrypt_primed
    }

    /// Word order selected for this session
    pub const fn word_order(&self) -> WordOrder {
        self.order
    }

    /// Open a session: ungate the peripheral clock
    pub fn begin(&mut self) {
        self.periph.enable_clock();
        self.session_open = true;
        self.decrypt_primed = false;
    }

    /// Close the session: clear enable and gate the clock
    pub fn end(&mut self) {
        self.periph.set_enabled(false);
        self.periph.disable_clock();
        self.session_open = false;
        self.decrypt_primed = false;
    }

    /// Program chaining mode, key size, optional key and IV
    ///
    /// `key == None` leaves the key registers to the co-processor.
    ///
    /// # Panics
    /// Panics if `key` is shorter than `key_size`.
    pub fn configure(
        &mut self,
        key: Option<&[u8]>,
        iv: &Block,
        chaining: ChainingMode,
        key_size: KeySize,
        order: WordOrder,
    ) {
        self.periph.set_enabled(false);
        self.periph.set_mode(AesControl::new(chaining, key_size));

        if let Some(key) = key {
            assert!(key.len() >= key_size.bytes(), "key shorter than key size");
            let count = key_size.bytes() / 4;
            let mut words = [0u32; 8];
            for (w, c) in words[..count].iter_mut().zip(key.chunks_exact(4)) {
                *w = order.word([c[0], c[1], c[2], c[3]]);
            }
            self.periph.write_key(&words[..count]);
            secure_zero_words(&mut words);
        }

        let mut iv_words = order.block_to_words(iv);
        self.periph.write_iv(&iv_words);
        secure_zero_words(&mut iv_words);

        self.order = order;
        self.decrypt_primed = false;
    }

    /// Set the enable bit
    pub fn enable(&mut self) {
        self.periph.set_enabled(true);
    }

    /// Clear the enable bit
    pub fn disable(&mut self) {
        self.periph.set_enabled(false);
    }

    /// Change the operating mode, keeping the other control fields
    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        let control = self.periph.control().with_mode(mode);
        self.periph.set_mode(control);
    }

    /// Change the GCM phase, keeping the other control fields
    pub fn set_phase(&mut self, phase: GcmPhase) {
        let control = self.periph.control().with_phase(phase);
        self.periph.set_mode(control);
    }

    /// Program the number of padding bytes in the final GCM payload block
    pub fn set_padding(&mut self, padding_bytes: u8) {
        let control = self.periph.control().with_padding(padding_bytes);
        self.periph.set_mode(control);
    }

    fn wait_and_acknowledge(&mut self) -> CryptoResult<()> {
        self.periph.wait_ready(self.timeout_cycles)?;
        self.periph.clear_ready();
        Ok(())
    }

    /// Enable the peripheral for a computation that takes no data
    /// (key derivation, GCM hash subkey) and wait for it to complete
    ///
    /// The enable bit is cleared again on failure.
    pub fn run_setup_cycle(&mut self) -> CryptoResult<()> {
        self.enable();
        let result = self.wait_and_acknowledge();
        if result.is_err() {
            self.disable();
        }
        result
    }

    /// Derive the decryption key schedule once for this session
    pub fn prime_decrypt(&mut self) -> CryptoResult<()> {
        if self.decrypt_primed {
            return Ok(());
        }
        self.set_operating_mode(OperatingMode::KeyDerivation);
        self.run_setup_cycle()?;
        self.decrypt_primed = true;
        Ok(())
    }

    /// Push one block and read the result
    pub fn process_block(&mut self, input: &Block) -> CryptoResult<Block> {
        let mut words = self.order.block_to_words(input);
        self.periph.push_block(&words);
        secure_zero_words(&mut words);

        self.periph.wait_ready(self.timeout_cycles)?;
        self.periph.clear_ready();

        let mut out = self.periph.pop_block();
        let block = self.order.words_to_block(&out);
        secure_zero_words(&mut out);
        Ok(block)
    }

    /// Push one block without reading the output register
    pub fn absorb_block(&mut self, input: &Block) -> CryptoResult<()> {
        let mut words = self.order.block_to_words(input);
        self.periph.push_block(&words);
        secure_zero_words(&mut words);
        self.wait_and_acknowledge()
    }

    /// Process a short block, zero-padded, copying back only `input.len()`
    /// bytes
    ///
    /// # Panics
    /// Panics if `input` is longer than a block or `output` is shorter
    /// than `input`.
    pub fn process_partial(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        assert!(input.len() <= AES_BLOCK_SIZE, "partial block too long");
        let mut block = [0u8; AES_BLOCK_SIZE];
        block[..input.len()].copy_from_slice(input);
        let result = self.process_block(&block);
        secure_zero(&mut block);

        let mut out = result?;
        output[..input.len()].copy_from_slice(&out[..input.len()]);
        secure_zero(&mut out);
        Ok(())
    }

    /// Absorb a short block, zero-padded
    ///
    /// # Panics
    /// Panics if `input` is longer than a block.
    pub fn absorb_partial(&mut self, input: &[u8]) -> CryptoResult<()> {
        assert!(input.len() <= AES_BLOCK_SIZE, "partial block too long");
        let mut block = [0u8; AES_BLOCK_SIZE];
        block[..input.len()].copy_from_slice(input);
        let result = self.absorb_block(&block);
        secure_zero(&mut block);
        result
    }

    /// Run whole blocks of `input` through the peripheral into `output`
    pub fn process_blocks(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        for (src, dst) in input
            .chunks_exact(AES_BLOCK_SIZE)
            .zip(output.chunks_exact_mut(AES_BLOCK_SIZE))
        {
            let mut block = [0u8; AES_BLOCK_SIZE];
            block.copy_from_slice(src);
            let out = self.process_block(&block)?;
            dst.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Run `input` (any length) through the peripheral, the last block
    /// zero-padded
    pub fn process_stream(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        let full = input.len() - input.len() % AES_BLOCK_SIZE;
        self.process_blocks(&input[..full], &mut output[..full])?;
        if full < input.len() {
            self.process_partial(&input[full..], &mut output[full..input.len()])?;
        }
        Ok(())
    }

    /// Encrypt whole blocks with the loaded key
    pub fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        check_block_lengths(input, output)?;

        self.set_operating_mode(OperatingMode::Encrypt);
        self.enable();
        let result = self.process_blocks(input, output);
        self.disable();
        result
    }

    /// Decrypt whole blocks with the loaded key
    ///
    /// The first call in a session runs the priming pass.
    pub fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        check_block_lengths(input, output)?;

        self.prime_decrypt()?;
        self.set_operating_mode(OperatingMode::Decrypt);
        self.enable();
        let result = self.process_blocks(input, output);
        self.disable();
        result
    }
}

fn check_block_lengths(input: &[u8], output: &[u8]) -> CryptoResult<()> {
    if input.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidLength);
    }
    if output.len() < input.len() {
        return Err(CryptoError::BufferTooSmall);
    }
    Ok(())
}
