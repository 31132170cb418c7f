// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Factory slot known-answer records
//!
//! Each factory key slot has one record: an IV, a 16-byte plaintext and the
//! CBC ciphertext the slot's key must produce for it. The records are
//! produced at provisioning time through the raw (native word order) path
//! and are the only way to check factory keys without reading them.

use q_common::constants::{
    AES_BLOCK_SIZE, AES_IV_SIZE, ENCLAVE_FACTORY_KEY_SLOTS, ENCLAVE_SIGNATURE_SIZE,
};

use crate::engine::VerificationRecords;
use crate::zeroize_utils::constant_time_compare;

// ============================================================================
// Records
// ============================================================================

/// Known-answer record for one factory slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationRecord {
    /// CBC IV programmed when the slot is loaded
    pub iv: [u8; AES_IV_SIZE],
    /// Plaintext block
    pub input: [u8; ENCLAVE_SIGNATURE_SIZE],
    /// Expected ciphertext block
    pub expected: [u8; ENCLAVE_SIGNATURE_SIZE],
}

impl VerificationRecord {
    /// Check a ciphertext against the expected block
    #[must_use]
    pub fn matches(&self, output: &[u8; AES_BLOCK_SIZE]) -> bool {
        constant_time_compare(output, &self.expected)
    }
}

/// Production records for slots 1..=10
pub const FACTORY_RECORDS: VerificationRecords = [
    // Slot 1
    VerificationRecord {
        iv: [
            0xac, 0x5d, 0x68, 0xb8, 0x79, 0x74, 0xfc, 0x7f,
            0x45, 0x02, 0x82, 0xf1, 0x48, 0x7e, 0x75, 0x8a,
        ],
        input: [
            0x9f, 0x5c, 0xb1, 0x43, 0x17, 0x53, 0x18, 0x8c,
            0x66, 0x3d, 0x39, 0x45, 0x90, 0x13, 0xa9, 0xde,
        ],
        expected: [
            0xe9, 0x9a, 0xce, 0xe9, 0x4d, 0xe1, 0x7f, 0x55,
            0xcb, 0x8a, 0xbf, 0xf2, 0x4d, 0x98, 0x27, 0x67,
        ],
    },
    // Slot 2
    VerificationRecord {
        iv: [
            0x38, 0xe6, 0x6a, 0x90, 0x5e, 0x5b, 0x8a, 0xa6,
            0x70, 0x30, 0x04, 0x72, 0xc2, 0x42, 0xea, 0xaf,
        ],
        input: [
            0xc5, 0x98, 0xe9, 0x17, 0xb8, 0x97, 0x9e, 0x03,
            0x33, 0x14, 0x13, 0x8f, 0xce, 0x74, 0x0d, 0x54,
        ],
        expected: [
            0x34, 0x27, 0xa7, 0xea, 0xa8, 0x98, 0x66, 0x9b,
            0xed, 0x43, 0xd3, 0x93, 0xb5, 0xa2, 0x87, 0x8e,
        ],
    },
    // Slot 3
    VerificationRecord {
        iv: [
            0x73, 0xd5, 0x8e, 0xfb, 0x0f, 0x4b, 0xa9, 0x79,
            0x0f, 0xde, 0x0e, 0x53, 0x44, 0x7d, 0xaa, 0xfd,
        ],
        input: [
            0x34, 0xba, 0x99, 0x59, 0x9f, 0x70, 0x67, 0xe9,
            0x09, 0xee, 0x64, 0x0e, 0xb3, 0xba, 0xfb, 0x75,
        ],
        expected: [
            0x6c, 0xf3, 0x01, 0x78, 0x53, 0x1b, 0x11, 0x32,
            0xf0, 0x27, 0x2f, 0xe3, 0x7d, 0xa6, 0xe2, 0xfd,
        ],
    },
    // Slot 4
    VerificationRecord {
        iv: [
            0x3c, 0x9a, 0xf4, 0x43, 0x2b, 0xfe, 0xea, 0xae,
            0x8c, 0xc6, 0xd1, 0x60, 0xd2, 0x96, 0x64, 0xa9,
        ],
        input: [
            0xdc, 0xfa, 0x6c, 0x9a, 0x6f, 0x0a, 0x3e, 0xdc,
            0x42, 0xf6, 0xae, 0x0d, 0x3c, 0xf7, 0x83, 0xaf,
        ],
        expected: [
            0xdf, 0x7f, 0x37, 0x65, 0x2f, 0xdb, 0x7c, 0xcf,
            0x5b, 0xb6, 0xe4, 0x9c, 0x63, 0xc5, 0x0f, 0xe0,
        ],
    },
    // Slot 5
    VerificationRecord {
        iv: [
            0x10, 0xac, 0x7b, 0x63, 0x03, 0x7f, 0x43, 0x18,
            0xec, 0x9d, 0x9c, 0xc4, 0x01, 0xdc, 0x35, 0xa7,
        ],
        input: [
            0xea, 0x2d, 0xe3, 0x1f, 0x02, 0x99, 0x1a, 0x7e,
            0x6d, 0x93, 0x4c, 0xb5, 0x42, 0xf0, 0x7a, 0x9b,
        ],
        expected: [
            0x9b, 0x5c, 0xee, 0x44, 0x0e, 0xd1, 0xcb, 0x5f,
            0x28, 0x9f, 0x12, 0x17, 0x59, 0x64, 0x40, 0xbb,
        ],
    },
    // Slot 6
    VerificationRecord {
        iv: [
            0x26, 0x21, 0x64, 0xe6, 0xd0, 0xf2, 0x47, 0x49,
            0xdc, 0x36, 0xcd, 0x68, 0x0c, 0x91, 0x03, 0x44,
        ],
        input: [
            0x53, 0x5e, 0x04, 0xa2, 0x49, 0xa0, 0x73, 0x49,
            0x56, 0xb0, 0x88, 0x8c, 0x12, 0xa0, 0xe4, 0x18,
        ],
        expected: [
            0x94, 0xc2, 0x09, 0x98, 0x62, 0xa7, 0x2b, 0x93,
            0xed, 0x36, 0x1f, 0x10, 0xbc, 0x26, 0xbd, 0x41,
        ],
    },
    // Slot 7
    VerificationRecord {
        iv: [
            0x7a, 0xbd, 0xce, 0x9c, 0x24, 0x7a, 0x2a, 0xb1,
            0x3c, 0x4f, 0x5a, 0x7d, 0x80, 0x3e, 0xfc, 0x0d,
        ],
        input: [
            0x7d, 0xa7, 0xc5, 0x21, 0x7f, 0x12, 0x95, 0xdd,
            0x4d, 0x77, 0x01, 0xfa, 0x71, 0x88, 0x2b, 0x7f,
        ],
        expected: [
            0x4d, 0xb2, 0x2b, 0xc5, 0x96, 0x47, 0x61, 0xf4,
            0x16, 0xe0, 0x81, 0xc3, 0x8e, 0xb9, 0x9c, 0x9b,
        ],
    },
    // Slot 8
    VerificationRecord {
        iv: [
            0xcd, 0xdd, 0xd3, 0x02, 0x85, 0x65, 0x43, 0x83,
            0xf9, 0xac, 0x75, 0x2f, 0x21, 0xef, 0x28, 0x6b,
        ],
        input: [
            0xdc, 0x9b, 0xc5, 0xa7, 0x6b, 0x84, 0x5c, 0x37,
            0x7c, 0xec, 0x05, 0xa1, 0x9f, 0x91, 0x17, 0x3b,
        ],
        expected: [
            0xc3, 0x6b, 0x83, 0x55, 0x90, 0x38, 0x0f, 0xea,
            0xd1, 0x65, 0xbf, 0x32, 0x4f, 0x8e, 0x62, 0x5b,
        ],
    },
    // Slot 9
    VerificationRecord {
        iv: [
            0xab, 0x73, 0x70, 0xe8, 0xe2, 0x56, 0x0f, 0x58,
            0xab, 0x29, 0xa5, 0xb1, 0x13, 0x47, 0x5e, 0xe8,
        ],
        input: [
            0xea, 0xcf, 0xd9, 0x9b, 0x86, 0xcd, 0x2b, 0x43,
            0x54, 0x45, 0x82, 0xc6, 0xfe, 0x73, 0x1a, 0x1a,
        ],
        expected: [
            0x8d, 0x5e, 0x27, 0xbc, 0x14, 0x4f, 0x08, 0xa8,
            0x2b, 0x14, 0x89, 0x5e, 0xdf, 0x77, 0x04, 0x31,
        ],
    },
    // Slot 10
    VerificationRecord {
        iv: [
            0x4f, 0x3c, 0x43, 0x77, 0xde, 0xed, 0x79, 0xa1,
            0x8d, 0x4c, 0x1f, 0xfd, 0xdb, 0x96, 0x87, 0x2e,
        ],
        input: [
            0x77, 0xb8, 0x1b, 0x90, 0xb4, 0xb7, 0x32, 0x76,
            0x8f, 0x8a, 0x57, 0x06, 0xc7, 0xdd, 0x08, 0x90,
        ],
        expected: [
            0xc9, 0xf7, 0x03, 0xf1, 0x6c, 0x65, 0xad, 0x49,
            0x74, 0xbe, 0x00, 0x54, 0xfd, 0xa6, 0x9c, 0x32,
        ],
    },
];

// ============================================================================
// Results
// ============================================================================

/// Outcome of checking one factory slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCheck {
    /// Slot loaded and produced the expected ciphertext
    Passed,
    /// Slot loaded but the ciphertext did not match
    Failed,
    /// Slot could not be loaded
    Missing,
}

/// Per-slot results of a factory slot check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotResults {
    /// Results for slots 1..=10, in order
    pub slots: [SlotCheck; ENCLAVE_FACTORY_KEY_SLOTS as usize],
}

impl SlotResults {
    /// All slots missing
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [SlotCheck::Missing; ENCLAVE_FACTORY_KEY_SLOTS as usize],
        }
    }

    /// Slots that could be loaded
    #[must_use]
    pub fn present(&self) -> u8 {
        self.count(|c| c != SlotCheck::Missing)
    }

    /// Slots that produced the expected ciphertext
    #[must_use]
    pub fn valid(&self) -> u8 {
        self.count(|c| c == SlotCheck::Passed)
    }

    /// Every factory slot passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.slots.iter().all(|&c| c == SlotCheck::Passed)
    }

    fn count(&self, pred: impl Fn(SlotCheck) -> bool) -> u8 {
        self.slots.iter().filter(|&&c| pred(c)).fold(0u8, |n, _| n + 1)
    }
}

impl Default for SlotResults {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_records_are_distinct() {
        for (i, a) in FACTORY_RECORDS.iter().enumerate() {
            for b in &FACTORY_RECORDS[i + 1..] {
                assert_ne!(a.iv, b.iv);
                assert_ne!(a.expected, b.expected);
            }
        }
    }

    #[test]
    fn test_first_record() {
        assert_eq!(FACTORY_RECORDS[0].iv[0], 0xac);
        assert_eq!(FACTORY_RECORDS[0].input[15], 0xde);
        assert_eq!(FACTORY_RECORDS[9].expected[15], 0x32);
    }

    #[test]
    fn test_record_matches() {
        let record = FACTORY_RECORDS[3];
        assert!(record.matches(&record.expected));
        let mut wrong = record.expected;
        wrong[7] ^= 0x01;
        assert!(!record.matches(&wrong));
    }

    #[test]
    fn test_slot_result_counts() {
        let mut results = SlotResults::new();
        assert_eq!((results.present(), results.valid()), (0, 0));

        results.slots = [SlotCheck::Passed; 10];
        results.slots[2] = SlotCheck::Failed;
        results.slots[9] = SlotCheck::Missing;
        assert_eq!(results.present(), 9);
        assert_eq!(results.valid(), 8);
        assert!(!results.all_passed());

        results.slots = [SlotCheck::Passed; 10];
        assert!(results.all_passed());
    }
}
