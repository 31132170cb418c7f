// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host Simulator
//!
//! Behavioural models of the STM32WB AES1 peripheral, the radio
//! co-processor key store and the TRNG. Used by host tests and the enclave-check
//! demo; never built for the target.
//!
//! # Fault Injection
//!
//! - [`SoftAes::set_stalled`]: completion flag never rises
//! - [`SimCoprocessor::set_alive`]: co-processor firmware stopped
//! - [`SimCoprocessor::fail_loads_for`]: loads of one slot fail
//! - [`SimCoprocessor::fail_stores_after`]: stores start failing
//! - [`SimRng::set_failing`]: RNG errors

pub mod aes;
pub mod coprocessor;
pub mod rng;

pub use aes::SoftAes;
pub use coprocessor::SimCoprocessor;
pub use rng::SimRng;

/// Create a peripheral and a co-processor wired to it
#[must_use]
pub fn simulated_device() -> (SoftAes, SimCoprocessor) {
    let aes = SoftAes::new();
    let link = SimCoprocessor::attached_to(&aes);
    (aes, link)
}
