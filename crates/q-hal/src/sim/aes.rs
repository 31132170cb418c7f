// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Software model of the AES1 peripheral
//!
//! Register semantics follow the silicon closely enough that the driver
//! code paths are identical on host and target:
//!
//! - data, key and IV words map to bytes most-significant first
//! - enabling in `KeyDerivation` mode derives the decryption key, raises
//!   CCF and drops EN
//! - enabling in GCM `Init` phase computes the hash subkey, raises CCF and
//!   drops EN
//! - CTR and GCM payload blocks increment the low IV word
//! - GCM payload encryption masks `padding_bytes` trailing bytes out of
//!   the authentication hash

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use ghash::universal_hash::UniversalHash;
use ghash::GHash;
use q_common::KeySize;
use zeroize::Zeroize;

use crate::traits::{AesControl, AesPeripheral, ChainingMode, GcmPhase, OperatingMode};

type Block = [u8; 16];

enum Cipher {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl Cipher {
    fn encrypt(&self, block: &Block) -> Block {
        let mut out = *block;
        let ga = GenericArray::from_mut_slice(&mut out);
        match self {
            Self::Aes128(c) => c.encrypt_block(ga),
            Self::Aes256(c) => c.encrypt_block(ga),
        }
        out
    }

    fn decrypt(&self, block: &Block) -> Block {
        let mut out = *block;
        let ga = GenericArray::from_mut_slice(&mut out);
        match self {
            Self::Aes128(c) => c.decrypt_block(ga),
            Self::Aes256(c) => c.decrypt_block(ga),
        }
        out
    }
}

struct GcmState {
    hash: GHash,
    j0: Block,
}

pub(crate) struct AesState {
    control: AesControl,
    enabled: bool,
    clock: bool,
    /// KEYR0..KEYR7
    key: [u32; 8],
    /// IVR0..IVR3
    iv: [u32; 4],
    dout: [u32; 4],
    ccf: bool,
    derived: bool,
    derivations: u32,
    stalled: bool,
    gcm: Option<GcmState>,
}

impl AesState {
    fn new() -> Self {
        Self {
            control: AesControl::new(ChainingMode::Ecb, KeySize::Aes128),
            enabled: false,
            clock: false,
            key: [0; 8],
            iv: [0; 4],
            dout: [0; 4],
            ccf: false,
            derived: false,
            derivations: 0,
            stalled: false,
            gcm: None,
        }
    }

    fn cipher(&self) -> Cipher {
        let mut bytes = [0u8; 32];
        let words = match self.control.key_size {
            KeySize::Aes128 => 4,
            KeySize::Aes256 => 8,
        };
        for i in 0..words {
            let word = self.key[words - 1 - i];
            bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        let cipher = match self.control.key_size {
            KeySize::Aes128 => Cipher::Aes128(Aes128::new(GenericArray::from_slice(&bytes[..16]))),
            KeySize::Aes256 => Cipher::Aes256(Aes256::new(GenericArray::from_slice(&bytes))),
        };
        bytes.zeroize();
        cipher
    }

    fn iv_bytes(&self) -> Block {
        words_to_bytes(&[self.iv[3], self.iv[2], self.iv[1], self.iv[0]])
    }

    fn set_iv_bytes(&mut self, block: &Block) {
        let w = bytes_to_words(block);
        self.iv = [w[3], w[2], w[1], w[0]];
    }

    fn next_counter_block(&mut self) -> Block {
        let block = self.iv_bytes();
        self.iv[0] = self.iv[0].wrapping_add(1);
        block
    }

    fn complete(&mut self) {
        if !self.stalled {
            self.ccf = true;
        }
    }

    fn on_enable(&mut self) {
        if self.control.mode == OperatingMode::KeyDerivation {
            self.derived = true;
            self.derivations += 1;
            self.enabled = false;
            self.complete();
        } else if self.control.chaining == ChainingMode::Gcm && self.control.phase == GcmPhase::Init {
            let cipher = self.cipher();
            let h = cipher.encrypt(&[0u8; 16]);
            let mut j0 = self.iv_bytes();
            let counter = self.iv[0].wrapping_sub(1);
            j0[12..].copy_from_slice(&counter.to_be_bytes());
            self.gcm = Some(GcmState {
                hash: GHash::new(GenericArray::from_slice(&h)),
                j0,
            });
            self.enabled = false;
            self.complete();
        }
    }

    fn process(&mut self, input: &Block) -> Block {
        let mode = self.control.mode;
        let decrypting = mode == OperatingMode::Decrypt;

        match self.control.chaining {
            ChainingMode::Ecb => match mode {
                OperatingMode::Encrypt => self.cipher().encrypt(input),
                // Without a derived key the output is not plaintext
                _ if decrypting && self.derived => self.cipher().decrypt(input),
                _ => [0u8; 16],
            },
            ChainingMode::Cbc => {
                let chain = self.iv_bytes();
                if mode == OperatingMode::Encrypt {
                    let out = self.cipher().encrypt(&xor(input, &chain));
                    self.set_iv_bytes(&out);
                    out
                } else if decrypting && self.derived {
                    let out = xor(&self.cipher().decrypt(input), &chain);
                    self.set_iv_bytes(input);
                    out
                } else {
                    [0u8; 16]
                }
            }
            ChainingMode::Ctr => {
                let counter = self.next_counter_block();
                xor(input, &self.cipher().encrypt(&counter))
            }
            ChainingMode::Gcm => self.process_gcm(input, decrypting),
        }
    }

    fn process_gcm(&mut self, input: &Block, decrypting: bool) -> Block {
        match self.control.phase {
            GcmPhase::Init => [0u8; 16],
            GcmPhase::Header => {
                if let Some(gcm) = self.gcm.as_mut() {
                    gcm.hash.update(&[GenericArray::clone_from_slice(input)]);
                }
                [0u8; 16]
            }
            GcmPhase::Payload => {
                let counter = self.next_counter_block();
                let out = xor(input, &self.cipher().encrypt(&counter));
                let mut hashed = if decrypting { *input } else { out };
                let pad = usize::from(self.control.padding_bytes & 0xF);
                if !decrypting && pad > 0 {
                    hashed[16 - pad..].fill(0);
                }
                if let Some(gcm) = self.gcm.as_mut() {
                    gcm.hash.update(&[GenericArray::clone_from_slice(&hashed)]);
                }
                out
            }
            GcmPhase::Final => match self.gcm.take() {
                Some(mut gcm) => {
                    gcm.hash.update(&[GenericArray::clone_from_slice(input)]);
                    let s = gcm.hash.finalize();
                    let mut tag = self.cipher().encrypt(&gcm.j0);
                    for (t, b) in tag.iter_mut().zip(s.iter()) {
                        *t ^= b;
                    }
                    tag
                }
                None => [0u8; 16],
            },
        }
    }
}

fn xor(a: &Block, b: &Block) -> Block {
    let mut out = [0u8; 16];
    for i in 0..16 {
        out[i] = a[i] ^ b[i];
    }
    out
}

fn words_to_bytes(words: &[u32; 4]) -> Block {
    let mut out = [0u8; 16];
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

fn bytes_to_words(bytes: &Block) -> [u32; 4] {
    let mut out = [0u32; 4];
    for (word, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

/// Simulated AES1 peripheral
///
/// Cloning yields another handle to the same peripheral, so tests can keep
/// an observer handle while the engine owns the instance.
#[derive(Clone)]
pub struct SoftAes {
    state: Arc<Mutex<AesState>>,
}

impl SoftAes {
    /// Create a disabled, clock-gated peripheral with zeroed registers
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AesState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, AesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop raising the completion flag (simulates a hung peripheral)
    pub fn set_stalled(&self, stalled: bool) {
        self.state().stalled = stalled;
    }

    /// Number of decryption key derivations performed so far
    #[must_use]
    pub fn derivation_count(&self) -> u32 {
        self.state().derivations
    }

    /// Bus clock currently ungated
    #[must_use]
    pub fn is_clock_enabled(&self) -> bool {
        self.state().clock
    }

    /// All key registers read as zero
    #[must_use]
    pub fn key_registers_clear(&self) -> bool {
        self.state().key.iter().all(|&w| w == 0)
    }

    /// Key attach path used by the co-processor model
    pub(crate) fn attach_key(&self, material: &[u8], size: KeySize) {
        let mut state = self.state();
        state.key = [0; 8];
        let words = size.bytes() / 4;
        for i in 0..words {
            let chunk = &material[i * 4..i * 4 + 4];
            state.key[words - 1 - i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        state.control.key_size = size;
        state.derived = false;
    }

    /// Key detach path used by the co-processor model
    pub(crate) fn detach_key(&self) {
        let mut state = self.state();
        state.key.zeroize();
        state.derived = false;
    }
}

impl Default for SoftAes {
    fn default() -> Self {
        Self::new()
    }
}

impl AesPeripheral for SoftAes {
    fn enable_clock(&mut self) {
        self.state().clock = true;
    }

    fn disable_clock(&mut self) {
        self.state().clock = false;
    }

    fn set_mode(&mut self, control: AesControl) {
        self.state().control = control;
    }

    fn control(&self) -> AesControl {
        self.state().control
    }

    fn set_enabled(&mut self, enabled: bool) {
        let mut state = self.state();
        if !state.clock {
            return;
        }
        let rising = enabled && !state.enabled;
        state.enabled = enabled;
        if rising {
            state.on_enable();
        }
    }

    fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    fn write_key(&mut self, words: &[u32]) {
        let mut state = self.state();
        let count = words.len().min(8);
        for (i, word) in words.iter().take(count).enumerate() {
            state.key[count - 1 - i] = *word;
        }
        state.derived = false;
    }

    fn write_iv(&mut self, words: &[u32; 4]) {
        self.state().iv = [words[3], words[2], words[1], words[0]];
    }

    fn push_block(&mut self, words: &[u32; 4]) {
        let mut state = self.state();
        if !state.clock || !state.enabled {
            return;
        }
        let out = state.process(&words_to_bytes(words));
        state.dout = bytes_to_words(&out);
        state.complete();
    }

    fn pop_block(&mut self) -> [u32; 4] {
        self.state().dout
    }

    fn is_ready(&self) -> bool {
        self.state().ccf
    }

    fn clear_ready(&mut self) {
        self.state().ccf = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_words(bytes: &Block) -> [u32; 4] {
        bytes_to_words(bytes)
    }

    #[test]
    fn test_ecb_matches_aes_crate() {
        let key = [0x2Bu8; 32];
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_mode(AesControl::new(ChainingMode::Ecb, KeySize::Aes256));
        let mut key_words = [0u32; 8];
        for (w, c) in key_words.iter_mut().zip(key.chunks_exact(4)) {
            *w = u32::from_be_bytes([c[0], c[1], c[2], c[3]]);
        }
        aes.write_key(&key_words);
        aes.set_enabled(true);

        let pt = [0x11u8; 16];
        aes.push_block(&block_words(&pt));
        assert!(aes.is_ready());
        let ct = words_to_bytes(&aes.pop_block());

        let reference = Aes256::new(GenericArray::from_slice(&key));
        let mut expected = GenericArray::clone_from_slice(&pt);
        reference.encrypt_block(&mut expected);
        assert_eq!(&ct[..], expected.as_slice());
    }

    #[test]
    fn test_derivation_drops_enable() {
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_mode(
            AesControl::new(ChainingMode::Cbc, KeySize::Aes256).with_mode(OperatingMode::KeyDerivation),
        );
        aes.set_enabled(true);
        assert!(aes.is_ready());
        assert!(!aes.is_enabled());
        assert_eq!(aes.derivation_count(), 1);
    }

    #[test]
    fn test_gated_clock_ignores_writes() {
        let mut aes = SoftAes::new();
        aes.set_enabled(true);
        aes.push_block(&[1, 2, 3, 4]);
        assert!(!aes.is_ready());
        assert!(!aes.is_enabled());
    }

    #[test]
    fn test_stalled_never_completes() {
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_stalled(true);
        aes.set_enabled(true);
        aes.push_block(&[0; 4]);
        assert!(!aes.is_ready());
    }
}
