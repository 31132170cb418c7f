// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL trait definitions
//!
//! Platform-agnostic interfaces for the AES peripheral, the secure
//! co-processor link and the random number generator.

use crate::error::{HalError, HalResult};
use q_common::{CryptoKey, KeySize};

// ============================================================================
// Random Number Generator
// ============================================================================

/// Random number generator interface
pub trait RngInterface {
    /// Initialize the RNG
    fn init(&mut self) -> HalResult<()>;

    /// Fill buffer with random bytes
    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()>;

    /// Generate a random u32
    fn next_u32(&mut self) -> HalResult<u32> {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Check if RNG is ready
    fn is_ready(&self) -> bool;
}

// ============================================================================
// AES Peripheral
// ============================================================================

/// Block chaining mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainingMode {
    /// Electronic Codebook mode
    Ecb,
    /// Cipher Block Chaining mode
    Cbc,
    /// Counter mode
    Ctr,
    /// Galois/Counter Mode
    Gcm,
}

/// Operating mode of the AES core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Encryption
    Encrypt,
    /// Decryption key schedule preparation (the "init" pass)
    KeyDerivation,
    /// Decryption with a previously derived key
    Decrypt,
}

/// GCM processing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GcmPhase {
    /// Hash subkey computation
    Init,
    /// Additional authenticated data
    Header,
    /// Plaintext or ciphertext
    Payload,
    /// Length block and tag
    Final,
}

/// Configuration fields of the AES control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesControl {
    /// Chaining mode
    pub chaining: ChainingMode,
    /// Operating mode
    pub mode: OperatingMode,
    /// Key size
    pub key_size: KeySize,
    /// GCM phase (ignored outside GCM)
    pub phase: GcmPhase,
    /// Number of padding bytes in the last GCM payload block (0..=15)
    pub padding_bytes: u8,
}

impl AesControl {
    /// Encrypt-mode control word for the given chaining mode and key size
    #[must_use]
    pub const fn new(chaining: ChainingMode, key_size: KeySize) -> Self {
        Self {
            chaining,
            mode: OperatingMode::Encrypt,
            key_size,
            phase: GcmPhase::Init,
            padding_bytes: 0,
        }
    }

    /// Same control word with a different operating mode
    #[must_use]
    pub const fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same control word with a different GCM phase
    #[must_use]
    pub const fn with_phase(mut self, phase: GcmPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Same control word with a different payload padding count
    #[must_use]
    pub const fn with_padding(mut self, padding_bytes: u8) -> Self {
        self.padding_bytes = padding_bytes;
        self
    }
}

/// Register-level AES block cipher peripheral
///
/// Words are exchanged exactly as they are written to and read from the
/// data, key and IV registers; byte-order conversion is the caller's job.
///
/// Two edges start work without any data: enabling the peripheral in
/// `KeyDerivation` mode, and enabling it in GCM `Init` phase. Both raise
/// the completion flag when done.
pub trait AesPeripheral {
    /// Ungate the peripheral bus clock
    fn enable_clock(&mut self);

    /// Gate the peripheral bus clock
    fn disable_clock(&mut self);

    /// Program the configuration fields, leaving the enable bit untouched
    fn set_mode(&mut self, control: AesControl);

    /// Read back the configuration fields
    fn control(&self) -> AesControl;

    /// Set or clear the enable bit
    fn set_enabled(&mut self, enabled: bool);

    /// Current state of the enable bit
    fn is_enabled(&self) -> bool;

    /// Load key words, most significant word first (8 words for 256-bit,
    /// 4 words for 128-bit keys)
    fn write_key(&mut self, words: &[u32]);

    /// Load the IV/counter register, most significant word first
    fn write_iv(&mut self, words: &[u32; 4]);

    /// Write one block to the data input register
    fn push_block(&mut self, words: &[u32; 4]);

    /// Read one block from the data output register
    fn pop_block(&mut self) -> [u32; 4];

    /// Computation-complete flag
    fn is_ready(&self) -> bool;

    /// Clear the computation-complete flag
    fn clear_ready(&mut self);

    /// Read or write error flag
    fn has_error(&self) -> bool {
        false
    }

    /// Clear the read/write error flags
    fn clear_error(&mut self) {}

    /// Check the completion flag once
    ///
    /// `None` while the computation is still running. A set error flag is
    /// cleared and reported as [`HalError::CryptoError`].
    fn poll_ready(&mut self) -> Option<HalResult<()>> {
        if !self.is_ready() {
            return None;
        }
        if self.has_error() {
            self.clear_error();
            return Some(Err(HalError::CryptoError));
        }
        Some(Ok(()))
    }

    /// Poll for completion, giving up after `timeout_cycles` polls
    ///
    /// The budget counts polls, not CPU cycles. Drivers with a cycle
    /// counter override this with [`wait_cycles`]. On success the
    /// completion flag is left set; the caller clears it after reading
    /// the output.
    fn wait_ready(&mut self, timeout_cycles: u32) -> HalResult<()> {
        for _ in 0..timeout_cycles {
            if let Some(result) = self.poll_ready() {
                return result;
            }
            core::hint::spin_loop();
        }

        Err(HalError::Timeout)
    }
}

/// Poll `periph` until it completes or `timeout_cycles` cycles of `now`
/// have elapsed
///
/// `now` is a free-running 32-bit cycle counter such as the Cortex-M DWT
/// `CYCCNT`. Elapsed time is computed with wrapping arithmetic, so a
/// counter rollover during the wait is harmless.
pub fn wait_cycles<P, F>(periph: &mut P, timeout_cycles: u32, mut now: F) -> HalResult<()>
where
    P: AesPeripheral + ?Sized,
    F: FnMut() -> u32,
{
    let start = now();
    loop {
        if let Some(result) = periph.poll_ready() {
            return result;
        }
        if now().wrapping_sub(start) >= timeout_cycles {
            return Err(HalError::Timeout);
        }
        core::hint::spin_loop();
    }
}

// ============================================================================
// Secure Co-processor Link
// ============================================================================

/// Status of a co-processor request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Request completed
    Ok,
    /// Co-processor rejected the request or could not serve it now
    Busy,
    /// Co-processor or the addressed slot is not available
    Unavailable,
}

impl LinkStatus {
    /// Request completed
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Request/response link to the secure co-processor holding the key slots
///
/// `load_key` attaches the slot's key to the AES peripheral key registers
/// without the key bytes ever crossing to this side. IVs are programmed
/// locally.
pub trait CoprocessorLink {
    /// Co-processor firmware is running
    fn is_alive(&self) -> bool;

    /// Store key material, returning the assigned slot
    fn store_key(&mut self, key: &CryptoKey<'_>) -> Result<u8, LinkStatus>;

    /// Attach the key in `slot` to the AES peripheral
    fn load_key(&mut self, slot: u8) -> LinkStatus;

    /// Detach the key in `slot` from the AES peripheral
    fn unload_key(&mut self, slot: u8) -> LinkStatus;
}
