// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Engine error types
//!
//! Errors returned by the AES engine, the CTR/GCM codecs and the key
//! enclave. Programmer errors (bad slot, bad key size) are not represented
//! here; those assert.

use core::fmt;

use q_hal::HalError;

/// Error type for engine and enclave operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Co-processor unreachable, not running, or rejected the request
    Transport,
    /// Peripheral did not signal completion within its deadline
    Timeout,
    /// GCM tag mismatch
    AuthFailure,
    /// Operation issued out of order
    InvalidState,
    /// Output buffer shorter than the input
    BufferTooSmall,
    /// Data length not a whole number of blocks
    InvalidLength,
    /// Random number generator failure
    RngFailure,
    /// Peripheral reported a read/write error or fault
    Hardware,
}

impl CryptoError {
    /// Get error code for logging/debugging
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Transport => 0x0110,
            Self::Timeout => 0x0111,
            Self::AuthFailure => 0x0108,
            Self::InvalidState => 0x0112,
            Self::BufferTooSmall => 0x0106,
            Self::InvalidLength => 0x0113,
            Self::RngFailure => 0x0105,
            Self::Hardware => 0x0114,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Transport => "co-processor transport failure",
            Self::Timeout => "peripheral timeout",
            Self::AuthFailure => "authentication failed",
            Self::InvalidState => "operation out of order",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidLength => "length not block aligned",
            Self::RngFailure => "RNG failure",
            Self::Hardware => "peripheral error",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<HalError> for CryptoError {
    fn from(e: HalError) -> Self {
        match e {
            HalError::Timeout => Self::Timeout,
            HalError::RngError => Self::RngFailure,
            HalError::InvalidState | HalError::NotInitialized => Self::InvalidState,
            HalError::InvalidParameter => Self::InvalidLength,
            HalError::Busy => Self::Transport,
            _ => Self::Hardware,
        }
    }
}

impl From<CryptoError> for q_common::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Transport => Self::EnclaveTransport,
            CryptoError::Timeout => Self::Timeout,
            CryptoError::AuthFailure => Self::AuthenticationFailed,
            CryptoError::InvalidState => Self::InvalidState,
            CryptoError::BufferTooSmall => Self::BufferTooSmall,
            CryptoError::InvalidLength => Self::InvalidParameter,
            CryptoError::RngFailure => Self::RngFailure,
            CryptoError::Hardware => Self::PeripheralError,
        }
    }
}

/// Result type for engine operations
pub type CryptoResult<T> = Result<T, CryptoError>;
