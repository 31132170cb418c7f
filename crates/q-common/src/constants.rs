// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Compile-time constants for the crypto engine
//!
//! All sizes and limits are fixed at build time. Slot numbering is shared
//! with the co-processor firmware and must not change.

// =============================================================================
// Block Cipher Constants
// =============================================================================

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// AES-128 key size in bytes
pub const AES128_KEY_SIZE: usize = 16;

/// AES-256 key size in bytes
pub const AES256_KEY_SIZE: usize = 32;

/// IV register size in bytes (CBC IV, or nonce + counter for CTR/GCM)
pub const AES_IV_SIZE: usize = 16;

// =============================================================================
// Counter Mode Constants
// =============================================================================

/// CTR nonce size in bytes
pub const CTR_NONCE_SIZE: usize = 12;

/// CTR counter size in bytes
pub const CTR_COUNTER_SIZE: usize = 4;

/// First counter value of the CTR keystream
pub const CTR_INITIAL_COUNTER: u32 = 1;

// =============================================================================
// GCM Constants
// =============================================================================

/// AES-GCM nonce size in bytes
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// AES-GCM counter size in bytes
pub const AES_GCM_COUNTER_SIZE: usize = 4;

/// AES-GCM tag size in bytes
pub const AES_GCM_TAG_SIZE: usize = 16;

/// First counter value used for GCM payload blocks.
///
/// Counter value 1 is J0 and is consumed internally for the tag.
pub const GCM_INITIAL_COUNTER: u32 = 2;

// =============================================================================
// Key Enclave Constants
// =============================================================================

/// Number of immutable factory-provisioned key slots (slots 1..=10)
pub const ENCLAVE_FACTORY_KEY_SLOTS: u8 = 10;

/// Highest key slot addressable on the co-processor
pub const ENCLAVE_MAX_KEY_SLOT: u8 = 100;

/// Size of the known-answer block used for enclave verification
pub const ENCLAVE_SIGNATURE_SIZE: usize = 16;

/// Size of the info header that precedes `Encrypted` key material
pub const ENCRYPTED_KEY_INFO_SIZE: usize = 12;

// =============================================================================
// Timing Constants
// =============================================================================

/// Core clock of the reference target (STM32WB55 at 64 MHz)
pub const CORE_CLOCK_HZ: u32 = 64_000_000;

/// Default completion wait budget (~1 ms at the reference core clock)
pub const AES_WAIT_TIMEOUT_CYCLES: u32 = CORE_CLOCK_HZ / 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_geometry() {
        assert_eq!(CTR_NONCE_SIZE + CTR_COUNTER_SIZE, AES_IV_SIZE);
        assert_eq!(AES_GCM_NONCE_SIZE + AES_GCM_COUNTER_SIZE, AES_IV_SIZE);
    }

    #[test]
    fn test_counter_conventions() {
        assert_eq!(CTR_INITIAL_COUNTER, 1);
        assert_eq!(GCM_INITIAL_COUNTER, 2);
    }

    #[test]
    fn test_slot_ranges() {
        assert!(ENCLAVE_FACTORY_KEY_SLOTS < ENCLAVE_MAX_KEY_SLOT);
    }
}
