// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Key data model
//!
//! Keys handed to the enclave are described by a type and a size. The
//! caller owns the buffer until it is stored; after that the raw bytes live
//! only inside the co-processor.

use core::fmt;

use crate::constants::{
    AES128_KEY_SIZE, AES256_KEY_SIZE, ENCLAVE_FACTORY_KEY_SLOTS, ENCLAVE_MAX_KEY_SLOT,
    ENCRYPTED_KEY_INFO_SIZE,
};

/// Key type as understood by the co-processor store command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyType {
    /// Master key used by the co-processor to unwrap `Encrypted` keys
    Master = 0x00,
    /// Plain key material
    Simple = 0x01,
    /// Key material wrapped with the master key, preceded by a 12-byte info field
    Encrypted = 0x02,
}

impl KeyType {
    /// Length of the header that precedes the key bytes
    #[must_use]
    pub const fn info_len(&self) -> usize {
        match self {
            Self::Encrypted => ENCRYPTED_KEY_INFO_SIZE,
            Self::Master | Self::Simple => 0,
        }
    }

    /// Get the key type name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Simple => "simple",
            Self::Encrypted => "encrypted",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AES key size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 128-bit key (16 bytes)
    Aes128,
    /// 256-bit key (32 bytes)
    Aes256,
}

impl KeySize {
    /// Get key size in bytes
    #[must_use]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Aes128 => AES128_KEY_SIZE,
            Self::Aes256 => AES256_KEY_SIZE,
        }
    }

    /// Get key size in bits
    #[must_use]
    pub const fn bits(&self) -> u16 {
        match self {
            Self::Aes128 => 128,
            Self::Aes256 => 256,
        }
    }

    /// Infer the key size from a raw key length
    #[must_use]
    pub const fn from_len(len: usize) -> Option<Self> {
        match len {
            AES128_KEY_SIZE => Some(Self::Aes128),
            AES256_KEY_SIZE => Some(Self::Aes256),
            _ => None,
        }
    }
}

/// Key slot number on the co-processor (1..=100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeySlot(u8);

impl KeySlot {
    /// Create a slot, returning `None` outside 1..=100
    #[must_use]
    pub const fn new(slot: u8) -> Option<Self> {
        if slot == 0 || slot > ENCLAVE_MAX_KEY_SLOT {
            None
        } else {
            Some(Self(slot))
        }
    }

    /// Raw slot number
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Slot is one of the immutable factory slots
    #[must_use]
    pub const fn is_factory(&self) -> bool {
        self.0 <= ENCLAVE_FACTORY_KEY_SLOTS
    }

    /// Slot is an application-unique slot above the factory range
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        !self.is_factory()
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-owned key description handed to the enclave store operation
///
/// For `Encrypted` keys `data` starts with the 12-byte info field,
/// followed by the wrapped key bytes.
#[derive(Clone, Copy)]
pub struct CryptoKey<'a> {
    /// Key type
    pub key_type: KeyType,
    /// Key size
    pub size: KeySize,
    /// Key bytes (including the info header for `Encrypted` keys)
    pub data: &'a [u8],
}

impl<'a> CryptoKey<'a> {
    /// Create a key description
    #[must_use]
    pub const fn new(key_type: KeyType, size: KeySize, data: &'a [u8]) -> Self {
        Self {
            key_type,
            size,
            data,
        }
    }

    /// Number of bytes forwarded to the co-processor
    #[must_use]
    pub const fn record_len(&self) -> usize {
        self.key_type.info_len() + self.size.bytes()
    }
}

impl fmt::Debug for CryptoKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("key_type", &self.key_type)
            .field("size", &self.size)
            .field("data", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_size_bytes() {
        assert_eq!(KeySize::Aes128.bytes(), 16);
        assert_eq!(KeySize::Aes256.bytes(), 32);
        assert_eq!(KeySize::from_len(32), Some(KeySize::Aes256));
        assert_eq!(KeySize::from_len(24), None);
    }

    #[test]
    fn test_record_len_includes_info_header() {
        let data = [0u8; 44];
        assert_eq!(CryptoKey::new(KeyType::Simple, KeySize::Aes256, &data).record_len(), 32);
        assert_eq!(CryptoKey::new(KeyType::Encrypted, KeySize::Aes256, &data).record_len(), 44);
        assert_eq!(CryptoKey::new(KeyType::Encrypted, KeySize::Aes128, &data).record_len(), 28);
    }

    #[test]
    fn test_key_slot_ranges() {
        assert!(KeySlot::new(0).is_none());
        assert!(KeySlot::new(101).is_none());
        assert!(KeySlot::new(10).map_or(false, |s| s.is_factory()));
        assert!(KeySlot::new(11).map_or(false, |s| s.is_unique()));
    }
}
