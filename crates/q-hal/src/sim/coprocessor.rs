// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Simulated secure co-processor
//!
//! Holds 100 key slots and attaches keys to a [`SoftAes`] instance on
//! load, the way the radio core firmware writes the AES1 key registers
//! directly. `Encrypted` keys are kept as delivered; the model does not
//! unwrap them with the master key.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use q_common::constants::ENCLAVE_MAX_KEY_SLOT;
use q_common::{CryptoKey, KeySize, KeyType};
use zeroize::Zeroize;

use super::aes::SoftAes;
use crate::traits::{CoprocessorLink, LinkStatus};

const SLOT_COUNT: usize = ENCLAVE_MAX_KEY_SLOT as usize + 1;

#[derive(Clone, Copy)]
struct StoredKey {
    key_type: KeyType,
    size: KeySize,
    material: [u8; 32],
}

struct CoprocState {
    alive: bool,
    slots: [Option<StoredKey>; SLOT_COUNT],
    failing_loads: [bool; SLOT_COUNT],
    store_budget: Option<u32>,
    loads: u32,
    stores: u32,
    attached: Option<u8>,
}

impl Drop for CoprocState {
    fn drop(&mut self) {
        for stored in self.slots.iter_mut().flatten() {
            stored.material.zeroize();
        }
    }
}

/// Simulated co-processor link
///
/// Cloning yields another handle to the same co-processor.
#[derive(Clone)]
pub struct SimCoprocessor {
    state: Arc<Mutex<CoprocState>>,
    aes: SoftAes,
}

impl SimCoprocessor {
    /// Create a running co-processor with empty slots, wired to `aes`
    #[must_use]
    pub fn attached_to(aes: &SoftAes) -> Self {
        Self {
            state: Arc::new(Mutex::new(CoprocState {
                alive: true,
                slots: [None; SLOT_COUNT],
                failing_loads: [false; SLOT_COUNT],
                store_budget: None,
                loads: 0,
                stores: 0,
                attached: None,
            })),
            aes: aes.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, CoprocState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a key straight into `slot`, bypassing the store command
    ///
    /// # Panics
    /// Panics if `slot` is outside 1..=100 or `material` is shorter than
    /// the key size.
    pub fn provision(&self, slot: u8, size: KeySize, material: &[u8]) {
        assert!((1..=ENCLAVE_MAX_KEY_SLOT).contains(&slot), "slot out of range");
        let mut stored = StoredKey {
            key_type: KeyType::Simple,
            size,
            material: [0u8; 32],
        };
        stored.material[..size.bytes()].copy_from_slice(&material[..size.bytes()]);
        self.state().slots[usize::from(slot)] = Some(stored);
    }

    /// Provision ten 256-bit factory keys into slots 1..=10
    pub fn provision_factory_keys(&self, keys: &[[u8; 32]; 10]) {
        for (slot, key) in (1u8..).zip(keys.iter()) {
            self.provision(slot, KeySize::Aes256, key);
        }
    }

    /// Copy of the key material held in `slot`
    #[must_use]
    pub fn stored_key(&self, slot: u8) -> Option<[u8; 32]> {
        self.state()
            .slots
            .get(usize::from(slot))
            .copied()
            .flatten()
            .map(|k| k.material)
    }

    /// Key type recorded for `slot`
    #[must_use]
    pub fn stored_key_type(&self, slot: u8) -> Option<KeyType> {
        self.state()
            .slots
            .get(usize::from(slot))
            .copied()
            .flatten()
            .map(|k| k.key_type)
    }

    /// Number of occupied slots
    #[must_use]
    pub fn occupied_slots(&self) -> usize {
        self.state().slots.iter().filter(|s| s.is_some()).count()
    }

    /// Start or stop the co-processor firmware
    pub fn set_alive(&self, alive: bool) {
        self.state().alive = alive;
    }

    /// Make every load of `slot` fail with `Busy`
    pub fn fail_loads_for(&self, slot: u8) {
        if let Some(flag) = self.state().failing_loads.get_mut(usize::from(slot)) {
            *flag = true;
        }
    }

    /// Clear all injected load failures
    pub fn clear_load_failures(&self) {
        self.state().failing_loads = [false; SLOT_COUNT];
    }

    /// Allow `count` more successful stores, then fail with `Busy`
    pub fn fail_stores_after(&self, count: u32) {
        self.state().store_budget = Some(count);
    }

    /// Number of successful load commands
    #[must_use]
    pub fn load_count(&self) -> u32 {
        self.state().loads
    }

    /// Number of successful store commands
    #[must_use]
    pub fn store_count(&self) -> u32 {
        self.state().stores
    }

    /// Slot whose key is currently attached to the AES peripheral
    #[must_use]
    pub fn attached_slot(&self) -> Option<u8> {
        self.state().attached
    }
}

impl CoprocessorLink for SimCoprocessor {
    fn is_alive(&self) -> bool {
        self.state().alive
    }

    fn store_key(&mut self, key: &CryptoKey<'_>) -> Result<u8, LinkStatus> {
        let mut state = self.state();
        if !state.alive {
            return Err(LinkStatus::Unavailable);
        }
        match state.store_budget {
            Some(0) => return Err(LinkStatus::Busy),
            Some(n) => state.store_budget = Some(n - 1),
            None => {}
        }

        let offset = key.key_type.info_len();
        let len = key.size.bytes();
        if key.data.len() < offset + len {
            return Err(LinkStatus::Busy);
        }

        let free = (1..SLOT_COUNT).find(|&i| state.slots[i].is_none());
        let Some(index) = free else {
            return Err(LinkStatus::Busy);
        };
        let slot = u8::try_from(index).map_err(|_| LinkStatus::Busy)?;

        let mut stored = StoredKey {
            key_type: key.key_type,
            size: key.size,
            material: [0u8; 32],
        };
        stored.material[..len].copy_from_slice(&key.data[offset..offset + len]);
        state.slots[index] = Some(stored);
        state.stores += 1;
        Ok(slot)
    }

    fn load_key(&mut self, slot: u8) -> LinkStatus {
        let mut state = self.state();
        if !state.alive {
            return LinkStatus::Unavailable;
        }
        let index = usize::from(slot);
        if state.failing_loads.get(index).copied().unwrap_or(false) {
            return LinkStatus::Busy;
        }
        let Some(stored) = state.slots.get(index).copied().flatten() else {
            return LinkStatus::Unavailable;
        };

        self.aes.attach_key(&stored.material, stored.size);
        state.attached = Some(slot);
        state.loads += 1;
        LinkStatus::Ok
    }

    fn unload_key(&mut self, slot: u8) -> LinkStatus {
        let mut state = self.state();
        if !state.alive {
            return LinkStatus::Unavailable;
        }
        self.aes.detach_key();
        if state.attached == Some(slot) {
            state.attached = None;
        }
        LinkStatus::Ok
    }
}
