// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel Hardware AES Engine and Key Enclave
//!
//! This crate drives the on-chip AES accelerator on behalf of the rest of
//! the firmware and fronts the secure co-processor that owns the device
//! key slots:
//!
//! - **Raw path**: ephemeral caller-supplied keys in ECB/CBC/CTR
//! - **CTR codec**: AES-CTR over arbitrary lengths with a 12-byte nonce
//! - **GCM codec**: AES-GCM encrypt-and-tag / decrypt-and-verify
//! - **Key enclave**: store, load, unload, verify and lazily create
//!   co-processor key slots without key bytes ever reaching this core
//!
//! # Concurrency
//!
//! One [`CryptoEngine`] owns the peripheral behind the crypto mutex and the
//! co-processor link behind a second, coarser lock. Every load returns a
//! handle owning the crypto mutex guard; dropping the handle tears the
//! session down, so neither lock can leak on an error path.
//!
//! # Security Requirements
//!
//! - Key material, IVs and plaintext are never logged
//! - Output buffers are zeroed on every failed CTR/GCM run
//! - GCM tags are compared in constant time

#![no_std]
#![allow(unsafe_code)] // Volatile zeroization
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

#[cfg(feature = "std")]
extern crate std;

// Core
pub mod error;
pub mod zeroize_utils;

// Peripheral session driver
pub mod driver;
pub mod engine;

// Codecs
pub mod ctr;
pub mod gcm;

// Key enclave
pub mod enclave;
pub mod info;
pub mod kat;

pub use driver::{BlockCipherDriver, WordOrder};
pub use enclave::{EnclaveKeyHandle, KeyEnclave};
pub use engine::{CryptoEngine, KeyHandle, SpinRawMutex, VerificationRecords};
pub use error::{CryptoError, CryptoResult};
pub use gcm::{GcmContext, GcmDirection};
pub use info::{enclave_info, write_enclave_info, EnclaveStatus};
pub use kat::{SlotCheck, SlotResults, VerificationRecord, FACTORY_RECORDS};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
