// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for the Qbitel crypto engine
//!
//! This module defines the unified error type that the HAL and the enclave
//! layer both convert into. All errors are `no_std` compatible and carry a
//! stable numeric code for logging without heap allocation.

use core::fmt;

/// Result type alias for crypto engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the crypto engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Cryptographic Errors (0x01xx)
    // =========================================================================
    /// Invalid cryptographic key format or size
    InvalidKey,
    /// Random number generator failure
    RngFailure,
    /// Authentication tag mismatch
    AuthenticationFailed,
    /// Key derivation (decrypt priming) failed
    KeyDerivationFailed,

    // =========================================================================
    // Enclave Errors (0x02xx)
    // =========================================================================
    /// Co-processor link reported a failure or is not running
    EnclaveTransport,
    /// Factory key slots failed known-answer verification
    EnclaveVerificationFailed,
    /// Slot outside the addressable range
    InvalidKeySlot,
    /// Co-processor slot table has no free entry
    EnclaveFull,

    // =========================================================================
    // HAL Errors (0x08xx)
    // =========================================================================
    /// Hardware initialization failed
    HardwareInitFailed,
    /// Peripheral reported a read or write error
    PeripheralError,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Buffer is too small for operation
    BufferTooSmall,
    /// Invalid parameter provided
    InvalidParameter,
    /// Operation timed out
    Timeout,
    /// Resource is busy
    Busy,
    /// Internal error (should not occur)
    InternalError,
    /// Invalid state for the operation
    InvalidState,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Cryptographic errors
    /// - 0x02xx: Enclave errors
    /// - 0x08xx: HAL errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Crypto errors (0x01xx)
            Self::InvalidKey => 0x0101,
            Self::RngFailure => 0x0105,
            Self::AuthenticationFailed => 0x0109,
            Self::KeyDerivationFailed => 0x0107,

            // Enclave errors (0x02xx)
            Self::EnclaveTransport => 0x0201,
            Self::EnclaveVerificationFailed => 0x0202,
            Self::InvalidKeySlot => 0x0203,
            Self::EnclaveFull => 0x0204,

            // HAL errors (0x08xx)
            Self::HardwareInitFailed => 0x0801,
            Self::PeripheralError => 0x0802,

            // General errors (0xFFxx)
            Self::BufferTooSmall => 0xFF01,
            Self::InvalidParameter => 0xFF02,
            Self::Timeout => 0xFF03,
            Self::Busy => 0xFF04,
            Self::InternalError => 0xFFFF,
            Self::InvalidState => 0xFF07,
        }
    }

    /// Check if this is a security-critical error
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey | Self::AuthenticationFailed | Self::EnclaveVerificationFailed
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid cryptographic key",
            Self::RngFailure => "RNG failure",
            Self::AuthenticationFailed => "authentication failed",
            Self::KeyDerivationFailed => "key derivation failed",
            Self::EnclaveTransport => "enclave transport failure",
            Self::EnclaveVerificationFailed => "enclave verification failed",
            Self::InvalidKeySlot => "invalid key slot",
            Self::EnclaveFull => "enclave full",
            Self::HardwareInitFailed => "hardware init failed",
            Self::PeripheralError => "peripheral error",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidParameter => "invalid parameter",
            Self::Timeout => "timeout",
            Self::Busy => "busy",
            Self::InternalError => "internal error",
            Self::InvalidState => "invalid state",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
