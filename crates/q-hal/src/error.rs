// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL error types

use core::fmt;

/// HAL error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Hardware not initialized
    NotInitialized,
    /// Hardware initialization failed
    InitFailed,
    /// RNG failure
    RngError,
    /// Invalid parameter
    InvalidParameter,
    /// Operation timeout
    Timeout,
    /// Hardware busy
    Busy,
    /// Operation not supported
    NotSupported,
    /// Invalid state for operation
    InvalidState,
    /// AES peripheral reported a read or write error
    CryptoError,
    /// Hardware fault detected
    HardwareFault,
}

impl HalError {
    /// Get error code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotInitialized => 0x0801,
            Self::InitFailed => 0x0802,
            Self::RngError => 0x0820,
            Self::CryptoError => 0x08C0,
            Self::HardwareFault => 0x08D0,
            Self::InvalidParameter => 0x08F0,
            Self::Timeout => 0x08F1,
            Self::Busy => 0x08F2,
            Self::InvalidState => 0x08F3,
            Self::NotSupported => 0x08FF,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not initialized",
            Self::InitFailed => "initialization failed",
            Self::RngError => "RNG error",
            Self::InvalidParameter => "invalid parameter",
            Self::Timeout => "timeout",
            Self::Busy => "busy",
            Self::NotSupported => "not supported",
            Self::InvalidState => "invalid state for operation",
            Self::CryptoError => "AES peripheral error",
            Self::HardwareFault => "hardware fault detected",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<HalError> for q_common::Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::NotInitialized | HalError::InitFailed | HalError::HardwareFault => {
                Self::HardwareInitFailed
            }
            HalError::RngError => Self::RngFailure,
            HalError::InvalidParameter => Self::InvalidParameter,
            HalError::Timeout => Self::Timeout,
            HalError::Busy => Self::Busy,
            HalError::NotSupported => Self::InternalError,
            HalError::InvalidState => Self::InvalidState,
            HalError::CryptoError => Self::PeripheralError,
        }
    }
}

/// HAL Result type
pub type HalResult<T> = Result<T, HalError>;
