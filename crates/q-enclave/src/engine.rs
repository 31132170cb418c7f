// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Crypto engine context
//!
//! [`CryptoEngine`] is the one owner of the AES peripheral and of the
//! co-processor link. It is constructed once at startup and shared by
//! reference; there is no global state.
//!
//! - the crypto mutex (`lock_api::Mutex<M, BlockCipherDriver<P>>`) is held
//!   from load to unload by a [`KeyHandle`]
//! - the co-processor lock (`lock_api::Mutex<M, L>`) is held only around
//!   each request to the co-processor and is shared with other subsystems
//!   via [`CryptoEngine::coprocessor`]
//!
//! # Lock type
//!
//! `M` is any [`lock_api::RawMutex`]. The default is `spin::Mutex<()>`,
//! which suits bare-metal and host builds. Under a preemptive RTOS plug in
//! the kernel mutex with [`CryptoEngine::with_raw_mutex`]: a spinning
//! high-priority thread would otherwise starve the lower-priority holder.

use core::fmt;

use lock_api::{Mutex, MutexGuard, RawMutex};
use q_common::constants::{AES_IV_SIZE, ENCLAVE_FACTORY_KEY_SLOTS};
use q_common::log::{LogBuffer, LogLevel};
use q_common::{CryptoEngineConfig, KeySize};
use q_hal::{AesPeripheral, ChainingMode, CoprocessorLink};

use crate::driver::{BlockCipherDriver, WordOrder};
use crate::error::CryptoResult;
use crate::kat::{VerificationRecord, FACTORY_RECORDS};

/// Default raw lock
pub type SpinRawMutex = spin::Mutex<()>;

/// Verification records for the factory slots
pub type VerificationRecords = [VerificationRecord; ENCLAVE_FACTORY_KEY_SLOTS as usize];

/// AES engine and key enclave context
pub struct CryptoEngine<P, L, M = SpinRawMutex> {
    pub(crate) driver: Mutex<M, BlockCipherDriver<P>>,
    pub(crate) link: Mutex<M, L>,
    log: Mutex<M, LogBuffer>,
    config: CryptoEngineConfig,
    pub(crate) records: VerificationRecords,
}

impl<P: AesPeripheral, L: CoprocessorLink> CryptoEngine<P, L> {
    /// Create an engine owning `periph` and `link`, locked with spin locks
    pub fn new(periph: P, link: L, config: CryptoEngineConfig) -> Self {
        Self::with_raw_mutex(periph, link, config)
    }
}

impl<P: AesPeripheral, L: CoprocessorLink, M: RawMutex> CryptoEngine<P, L, M> {
    /// Create an engine whose locks use the raw mutex `M`
    pub fn with_raw_mutex(periph: P, link: L, config: CryptoEngineConfig) -> Self {
        Self {
            driver: Mutex::new(BlockCipherDriver::new(periph, config.wait_timeout_cycles)),
            link: Mutex::new(link),
            log: Mutex::new(LogBuffer::new(config.log_level)),
            config,
            records: FACTORY_RECORDS,
        }
    }
}

impl<P, L, M: RawMutex> CryptoEngine<P, L, M> {
    /// Replace the factory verification records
    #[must_use]
    pub fn with_verification_records(mut self, records: VerificationRecords) -> Self {
        self.records = records;
        self
    }

    /// Engine configuration
    pub const fn config(&self) -> &CryptoEngineConfig {
        &self.config
    }

    /// Verification records checked by `verify`
    pub const fn verification_records(&self) -> &VerificationRecords {
        &self.records
    }

    /// Co-processor lock, for subsystems that talk to the co-processor
    /// outside the enclave (firmware update, radio stack)
    pub const fn coprocessor(&self) -> &Mutex<M, L> {
        &self.link
    }

    /// A key session is currently open
    pub fn is_busy(&self) -> bool {
        self.driver.is_locked()
    }

    /// Read the engine log
    pub fn with_log<R>(&self, f: impl FnOnce(&LogBuffer) -> R) -> R {
        let log = self.log.lock();
        f(&*log)
    }

    /// Current tick for log timestamps
    pub(crate) fn ticks(&self) -> u32 {
        (self.config.tick_source)()
    }

    /// Append a log entry; used through the `log_*!` macros
    pub(crate) fn log(
        &self,
        level: LogLevel,
        timestamp: u32,
        module: &'static str,
        args: fmt::Arguments<'_>,
    ) {
        self.log.lock().log(level, timestamp, module, args);
    }
}

impl<P: AesPeripheral, L, M: RawMutex> CryptoEngine<P, L, M> {
    /// Acquire the crypto mutex (blocking) and open a session
    pub(crate) fn open_session(&self) -> MutexGuard<'_, M, BlockCipherDriver<P>> {
        let mut driver = self.driver.lock();
        driver.begin();
        driver
    }

    fn try_open_session(&self) -> Option<MutexGuard<'_, M, BlockCipherDriver<P>>> {
        let mut driver = self.driver.try_lock()?;
        driver.begin();
        Some(driver)
    }

    /// Load an ephemeral key in CBC mode
    ///
    /// Blocks until the crypto mutex is free. The returned handle must be
    /// dropped (or unloaded) before the same thread loads again.
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes.
    pub fn load_key(&self, key: &[u8], iv: &[u8; AES_IV_SIZE]) -> KeyHandle<'_, P, M> {
        self.load_key_in_mode(key, iv, ChainingMode::Cbc)
    }

    /// Load an ephemeral key in ECB, CBC or CTR mode
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes, or if `chaining` is GCM.
    pub fn load_key_in_mode(
        &self,
        key: &[u8],
        iv: &[u8; AES_IV_SIZE],
        chaining: ChainingMode,
    ) -> KeyHandle<'_, P, M> {
        assert!(chaining != ChainingMode::Gcm, "GCM runs through gcm_encrypt_and_tag");
        let key_size = key_size_of(key);
        let mut driver = self.open_session();
        driver.configure(Some(key), iv, chaining, key_size, WordOrder::Native);
        KeyHandle::new(driver)
    }

    /// Load an ephemeral CBC key without blocking
    ///
    /// Returns `None` if another session holds the crypto mutex.
    ///
    /// # Panics
    /// Panics if `key` is not 16 or 32 bytes.
    pub fn try_load_key(
        &self,
        key: &[u8],
        iv: &[u8; AES_IV_SIZE],
    ) -> Option<KeyHandle<'_, P, M>> {
        let key_size = key_size_of(key);
        let mut driver = self.try_open_session()?;
        driver.configure(Some(key), iv, ChainingMode::Cbc, key_size, WordOrder::Native);
        Some(KeyHandle::new(driver))
    }

    /// Load a key with byte-swapped word order (CTR/GCM path)
    pub(crate) fn load_swapped(
        &self,
        key: &[u8],
        iv: &[u8; AES_IV_SIZE],
        chaining: ChainingMode,
    ) -> KeyHandle<'_, P, M> {
        let key_size = key_size_of(key);
        let mut driver = self.open_session();
        driver.configure(Some(key), iv, chaining, key_size, WordOrder::ByteSwapped);
        KeyHandle::new(driver)
    }
}

/// Key size for a raw key buffer
///
/// # Panics
/// Panics if `key` is not 16 or 32 bytes.
pub(crate) fn key_size_of(key: &[u8]) -> KeySize {
    match KeySize::from_len(key.len()) {
        Some(size) => size,
        None => panic!("AES key must be 16 or 32 bytes, got {}", key.len()),
    }
}

/// An open key session
///
/// Owns the crypto mutex. Dropping the handle clears the enable bit, gates
/// the peripheral clock and releases the mutex.
pub struct KeyHandle<'e, P: AesPeripheral, M: RawMutex = SpinRawMutex> {
    driver: MutexGuard<'e, M, BlockCipherDriver<P>>,
}

impl<'e, P: AesPeripheral, M: RawMutex> KeyHandle<'e, P, M> {
    pub(crate) fn new(driver: MutexGuard<'e, M, BlockCipherDriver<P>>) -> Self {
        Self { driver }
    }

    /// Encrypt whole 16-byte blocks
    ///
    /// # Errors
    /// `InvalidLength` for partial blocks, `BufferTooSmall` if `output` is
    /// shorter than `input`, `Timeout` if the peripheral stalls.
    pub fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        self.driver.encrypt(input, output)
    }

    /// Decrypt whole 16-byte blocks
    ///
    /// The first decrypt of the session runs the key derivation pass.
    ///
    /// # Errors
    /// As [`KeyHandle::encrypt`].
    pub fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        self.driver.decrypt(input, output)
    }

    /// The key derivation pass has already run in this session
    pub fn is_decrypt_primed(&self) -> bool {
        self.driver.is_decrypt_primed()
    }

    /// End the session
    pub fn unload(self) {}

    pub(crate) fn driver_mut(&mut self) -> &mut BlockCipherDriver<P> {
        &mut self.driver
    }
}

impl<P: AesPeripheral, M: RawMutex> Drop for KeyHandle<'_, P, M> {
    fn drop(&mut self) {
        self.driver.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_size_of() {
        assert_eq!(key_size_of(&[0; 16]), KeySize::Aes128);
        assert_eq!(key_size_of(&[0; 32]), KeySize::Aes256);
    }

    #[test]
    #[should_panic(expected = "AES key must be 16 or 32 bytes")]
    fn test_key_size_of_rejects_24() {
        let _ = key_size_of(&[0; 24]);
    }

    #[test]
    fn test_new_engine_is_idle() {
        let (aes, link) = q_hal::sim::simulated_device();
        let engine = CryptoEngine::new(aes, link, CryptoEngineConfig::DEFAULT);
        assert!(!engine.is_busy());
        assert!(!engine.coprocessor().is_locked());
        assert_eq!(engine.verification_records(), &FACTORY_RECORDS);
        assert_eq!(
            engine.config().wait_timeout_cycles,
            CryptoEngineConfig::DEFAULT.wait_timeout_cycles
        );
    }

    #[test]
    fn test_engine_with_explicit_spin_lock() {
        let (aes, link) = q_hal::sim::simulated_device();
        let engine: CryptoEngine<_, _, SpinRawMutex> =
            CryptoEngine::with_raw_mutex(aes, link, CryptoEngineConfig::DEFAULT);
        let handle = engine.load_key(&[0u8; 16], &[0u8; AES_IV_SIZE]);
        assert!(engine.is_busy());
        handle.unload();
        assert!(!engine.is_busy());
    }
}
