// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Co-processor key enclave
//!
//! Key slots 1..=100 live inside the secure co-processor. Slots 1..=10 are
//! factory slots, provisioned at manufacturing and checked against the
//! verification records. Higher slots are unique keys generated on the
//! device the first time they are needed.
//!
//! Loading a slot asks the co-processor to write the key straight into the
//! AES key registers; only the IV is programmed from this side.
//!
//! # Locking
//!
//! Every request to the co-processor takes the co-processor lock for the
//! duration of the round trip and releases it before returning, on success
//! and on failure. A loaded slot additionally holds the crypto mutex until
//! its [`EnclaveKeyHandle`] is unloaded or dropped.

use lock_api::RawMutex;
use q_common::constants::{
    AES_BLOCK_SIZE, AES_IV_SIZE, ENCLAVE_FACTORY_KEY_SLOTS, ENCLAVE_MAX_KEY_SLOT,
};
use q_common::log::MODULE_ENCLAVE;
use q_common::{log_debug, log_error, log_info, CryptoKey, KeySize, KeySlot, KeyType};
use q_hal::{AesPeripheral, ChainingMode, CoprocessorLink, LinkStatus, RngInterface};

use crate::driver::WordOrder;
use crate::engine::{CryptoEngine, KeyHandle, SpinRawMutex};
use crate::error::{CryptoError, CryptoResult};
use crate::info::EnclaveStatus;
use crate::kat::{SlotCheck, SlotResults, VerificationRecord};
use crate::zeroize_utils::KeyBuffer;

fn valid_slot(slot: u8) -> KeySlot {
    match KeySlot::new(slot) {
        Some(slot) => slot,
        None => panic!("key slot {slot} outside 1..={ENCLAVE_MAX_KEY_SLOT}"),
    }
}

impl<P, L, M> CryptoEngine<P, L, M> {
    /// Key enclave operations on this engine
    pub const fn enclave(&self) -> KeyEnclave<'_, P, L, M> {
        KeyEnclave { engine: self }
    }
}

/// Key enclave view of a [`CryptoEngine`]
pub struct KeyEnclave<'e, P, L, M = SpinRawMutex> {
    engine: &'e CryptoEngine<P, L, M>,
}

impl<'e, P: AesPeripheral, L: CoprocessorLink, M: RawMutex> KeyEnclave<'e, P, L, M> {
    // ========================================================================
    // Store
    // ========================================================================

    /// Store a key in the co-processor and return the slot it was given
    ///
    /// Holds the crypto mutex and the co-processor lock for the duration of
    /// the request.
    ///
    /// # Errors
    /// `Transport` if the co-processor is not running or rejects the key.
    ///
    /// # Panics
    /// Panics if `key.data` is shorter than the key record
    /// (`info_len + size`).
    pub fn store_key(&self, key: &CryptoKey<'_>) -> CryptoResult<u8> {
        let record_len = key.record_len();
        assert!(
            key.data.len() >= record_len,
            "{} key needs {} bytes of data",
            key.key_type,
            record_len
        );

        let _driver = self.engine.driver.lock();
        let mut link = self.engine.link.lock();

        if !link.is_alive() {
            log_error!(
                self.engine,
                self.engine.ticks(),
                MODULE_ENCLAVE,
                "Co-processor not running"
            );
            return Err(CryptoError::Transport);
        }

        let record = CryptoKey::new(key.key_type, key.size, &key.data[..record_len]);
        match link.store_key(&record) {
            Ok(slot) => {
                log_debug!(
                    self.engine,
                    self.engine.ticks(),
                    MODULE_ENCLAVE,
                    "Stored {} {}-bit key in slot {}",
                    key.key_type,
                    key.size.bits(),
                    slot
                );
                Ok(slot)
            }
            Err(status) => {
                log_error!(
                    self.engine,
                    self.engine.ticks(),
                    MODULE_ENCLAVE,
                    "Key store failed: {:?}",
                    status
                );
                Err(CryptoError::Transport)
            }
        }
    }

    // ========================================================================
    // Load / Unload
    // ========================================================================

    /// Load the key in `slot` with a CBC `iv`
    ///
    /// Blocks until the crypto mutex is free. On failure the mutex is
    /// released before returning.
    ///
    /// # Errors
    /// `Transport` if the co-processor is not running or cannot attach the
    /// slot (for example because it is empty).
    ///
    /// # Panics
    /// Panics if `slot` is outside 1..=100.
    pub fn load_key(
        &self,
        slot: u8,
        iv: &[u8; AES_IV_SIZE],
    ) -> CryptoResult<EnclaveKeyHandle<'e, P, L, M>> {
        let slot = valid_slot(slot).get();

        let mut session = KeyHandle::new(self.engine.open_session());
        let status = {
            let mut link = self.engine.link.lock();
            if link.is_alive() {
                session.driver_mut().configure(
                    None,
                    iv,
                    ChainingMode::Cbc,
                    KeySize::Aes256,
                    WordOrder::Native,
                );
                link.load_key(slot)
            } else {
                LinkStatus::Unavailable
            }
        };

        if !status.is_ok() {
            drop(session);
            log_debug!(
                self.engine,
                self.engine.ticks(),
                MODULE_ENCLAVE,
                "Slot {} load failed: {:?}",
                slot,
                status
            );
            return Err(CryptoError::Transport);
        }

        Ok(EnclaveKeyHandle {
            session,
            engine: self.engine,
            slot,
            attached: true,
        })
    }

    // ========================================================================
    // Verification
    // ========================================================================

    fn check_slot(&self, slot: u8, record: &VerificationRecord) -> SlotCheck {
        let Ok(mut handle) = self.load_key(slot, &record.iv) else {
            return SlotCheck::Missing;
        };

        let mut output = [0u8; AES_BLOCK_SIZE];
        let passed = handle.encrypt(&record.input, &mut output).is_ok() && record.matches(&output);
        handle.unload().ok();

        if passed {
            SlotCheck::Passed
        } else {
            SlotCheck::Failed
        }
    }

    /// Check every factory slot against its verification record
    pub fn verify_slots(&self) -> SlotResults {
        let mut results = SlotResults::new();
        let records = self.engine.records.iter();
        for ((slot, record), check) in (1u8..).zip(records).zip(results.slots.iter_mut()) {
            *check = self.check_slot(slot, record);
        }
        results
    }

    /// Count present and valid factory slots
    ///
    /// The enclave is healthy iff `valid == 10`.
    pub fn verify(&self) -> EnclaveStatus {
        let status = EnclaveStatus::from(&self.verify_slots());
        if !status.is_valid() {
            log_error!(
                self.engine,
                self.engine.ticks(),
                MODULE_ENCLAVE,
                "Secure Enclave verification failed: total {}, valid {}",
                status.present,
                status.valid
            );
        }
        status
    }

    /// Build the verification record for `slot` from a chosen IV and
    /// plaintext (provisioning)
    ///
    /// # Errors
    /// `Transport` if the slot cannot be loaded, or any encrypt error.
    pub fn make_record(
        &self,
        slot: u8,
        iv: &[u8; AES_IV_SIZE],
        input: &[u8; AES_BLOCK_SIZE],
    ) -> CryptoResult<VerificationRecord> {
        let mut handle = self.load_key(slot, iv)?;
        let mut expected = [0u8; AES_BLOCK_SIZE];
        let encrypted = handle.encrypt(input, &mut expected);
        handle.unload()?;
        encrypted?;
        Ok(VerificationRecord {
            iv: *iv,
            input: *input,
            expected,
        })
    }

    // ========================================================================
    // Unique keys
    // ========================================================================

    /// Make sure `slot` holds a key
    ///
    /// Factory slots cannot be created. For a factory slot the result is
    /// `slot <= present`, where `present` is the number of factory slots
    /// that could be loaded. This compares against a count, not against the
    /// slot itself: with slot 1 missing and slots 2..=10 present, `present`
    /// is 9, so slot 1 reports `true` and slot 10 reports `false`.
    ///
    /// For a unique slot, every missing slot from the highest present
    /// unique slot up to `slot` is filled with a fresh random 256-bit key.
    /// Nothing is generated unless all ten factory slots are present. The
    /// first failed store aborts; keys stored before it are kept.
    ///
    /// # Panics
    /// Panics if `slot` is outside 1..=100.
    pub fn ensure_key<R: RngInterface>(&self, slot: u8, rng: &mut R) -> bool {
        let target = valid_slot(slot);

        let status = self.verify();
        if target.is_factory() {
            return slot <= status.present;
        }
        if status.present < ENCLAVE_FACTORY_KEY_SLOTS {
            return false;
        }

        let empty_iv = [0u8; AES_IV_SIZE];
        let mut last_present = ENCLAVE_FACTORY_KEY_SLOTS;
        for candidate in (ENCLAVE_FACTORY_KEY_SLOTS + 1..=slot).rev() {
            if let Ok(handle) = self.load_key(candidate, &empty_iv) {
                handle.unload().ok();
                last_present = candidate;
                break;
            }
        }

        if last_present == slot {
            return true;
        }
        self.generate_unique_keys(last_present + 1, slot, rng)
    }

    fn generate_unique_keys<R: RngInterface>(&self, first: u8, last: u8, rng: &mut R) -> bool {
        log_info!(
            self.engine,
            self.engine.ticks(),
            MODULE_ENCLAVE,
            "Generating keys {}..{}",
            first,
            last
        );

        let mut next = first;
        while next <= last {
            let mut key_data = KeyBuffer::<32>::new();
            if rng.fill_bytes(key_data.as_mut_slice()).is_err() {
                log_error!(
                    self.engine,
                    self.engine.ticks(),
                    MODULE_ENCLAVE,
                    "RNG failure generating slot {}",
                    next
                );
                return false;
            }

            let key = CryptoKey::new(KeyType::Simple, KeySize::Aes256, key_data.as_slice());
            match self.store_key(&key) {
                Ok(assigned) => next = assigned.saturating_add(1),
                Err(_) => {
                    log_error!(
                        self.engine,
                        self.engine.ticks(),
                        MODULE_ENCLAVE,
                        "Error writing key to slot {}",
                        next
                    );
                    return false;
                }
            }
        }
        true
    }
}

/// A loaded enclave slot
///
/// Holds the crypto mutex. [`EnclaveKeyHandle::unload`] (or drop) clears the
/// enable bit, asks the co-processor to detach the key, gates the clock and
/// releases the mutex, whatever happened during the session.
pub struct EnclaveKeyHandle<'e, P, L, M = SpinRawMutex>
where
    P: AesPeripheral,
    L: CoprocessorLink,
    M: RawMutex,
{
    session: KeyHandle<'e, P, M>,
    engine: &'e CryptoEngine<P, L, M>,
    slot: u8,
    attached: bool,
}

impl<P: AesPeripheral, L: CoprocessorLink, M: RawMutex> EnclaveKeyHandle<'_, P, L, M> {
    /// Loaded slot
    pub const fn slot(&self) -> u8 {
        self.slot
    }

    /// Encrypt whole blocks with the slot key
    ///
    /// # Errors
    /// See [`KeyHandle::encrypt`].
    pub fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        self.session.encrypt(input, output)
    }

    /// Decrypt whole blocks with the slot key
    ///
    /// # Errors
    /// See [`KeyHandle::decrypt`].
    pub fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> CryptoResult<()> {
        self.session.decrypt(input, output)
    }

    /// The key derivation pass has already run in this session
    pub fn is_decrypt_primed(&self) -> bool {
        self.session.is_decrypt_primed()
    }

    /// Unload the slot and end the session
    ///
    /// The session ends and both locks are released even when this returns
    /// an error.
    ///
    /// # Errors
    /// `Transport` if the co-processor is not running or refuses to detach.
    pub fn unload(mut self) -> CryptoResult<()> {
        self.detach()
    }

    fn detach(&mut self) -> CryptoResult<()> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        self.session.driver_mut().disable();

        let status = {
            let mut link = self.engine.link.lock();
            if link.is_alive() {
                link.unload_key(self.slot)
            } else {
                LinkStatus::Unavailable
            }
        };

        if status.is_ok() {
            Ok(())
        } else {
            log_error!(
                self.engine,
                self.engine.ticks(),
                MODULE_ENCLAVE,
                "Slot {} unload failed: {:?}",
                self.slot,
                status
            );
            Err(CryptoError::Transport)
        }
    }
}

impl<P: AesPeripheral, L: CoprocessorLink, M: RawMutex> Drop for EnclaveKeyHandle<'_, P, L, M> {
    fn drop(&mut self) {
        self.detach().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bounds() {
        assert!(valid_slot(1).is_factory());
        assert!(valid_slot(ENCLAVE_FACTORY_KEY_SLOTS).is_factory());
        assert!(valid_slot(ENCLAVE_FACTORY_KEY_SLOTS + 1).is_unique());
        assert_eq!(valid_slot(ENCLAVE_MAX_KEY_SLOT).get(), ENCLAVE_MAX_KEY_SLOT);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_slot_zero_rejected() {
        valid_slot(0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_slot_above_range_rejected() {
        valid_slot(ENCLAVE_MAX_KEY_SLOT + 1);
    }
}
