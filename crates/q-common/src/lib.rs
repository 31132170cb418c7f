// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel Crypto Engine Common Library
//!
//! This crate provides the types shared by the hardware AES engine and the
//! secure key enclave: the unified error type, compile-time configuration,
//! the key data model and the ring-buffer logger.
//!
//! # Features
//!
//! - `std`: Enable standard library support (disabled by default for embedded)
//! - `defmt`: Enable defmt formatting of errors for embedded debugging
//!
//! # Security
//!
//! Nothing in this crate owns or formats key material. `CryptoKey` borrows
//! the caller's buffer and redacts it in `Debug`; the logger only ever sees
//! slot numbers, counts and error codes.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod types;
pub mod errors;
pub mod config;
pub mod log;
pub mod constants;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use types::*;
pub use config::CryptoEngineConfig;
