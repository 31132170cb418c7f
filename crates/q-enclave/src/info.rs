// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Enclave attestation report
//!
//! The device-info report carries exactly two enclave fields. Downstream
//! parsers match on them verbatim:
//!
//! ```text
//! enclave_valid_keys : 10
//! enclave_valid : true
//! ```

use core::fmt;

use q_common::constants::ENCLAVE_FACTORY_KEY_SLOTS;

use crate::kat::SlotResults;

/// Maximum length of the rendered report
pub const ENCLAVE_INFO_MAX_LEN: usize = 64;

/// Result of a factory slot check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnclaveStatus {
    /// Factory slots that could be loaded
    pub present: u8,
    /// Factory slots that produced their expected ciphertext
    pub valid: u8,
}

impl EnclaveStatus {
    /// Create a status from raw counts
    #[must_use]
    pub const fn new(present: u8, valid: u8) -> Self {
        Self { present, valid }
    }

    /// Every factory slot is valid
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid == ENCLAVE_FACTORY_KEY_SLOTS
    }
}

impl From<&SlotResults> for EnclaveStatus {
    fn from(results: &SlotResults) -> Self {
        Self::new(results.present(), results.valid())
    }
}

/// Write the two enclave report fields
///
/// # Errors
/// Propagates writer errors.
pub fn write_enclave_info<W: fmt::Write>(status: &EnclaveStatus, out: &mut W) -> fmt::Result {
    writeln!(out, "enclave_valid_keys : {}", status.valid)?;
    writeln!(out, "enclave_valid : {}", status.is_valid())
}

/// Render the report into a fixed-capacity string
///
/// # Errors
/// `fmt::Error` if the report does not fit in [`ENCLAVE_INFO_MAX_LEN`]
/// bytes.
pub fn enclave_info(
    status: &EnclaveStatus,
) -> Result<heapless::String<ENCLAVE_INFO_MAX_LEN>, fmt::Error> {
    let mut out = heapless::String::new();
    write_enclave_info(status, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_valid() {
        let report = enclave_info(&EnclaveStatus::new(10, 10)).unwrap();
        assert_eq!(report.as_str(), "enclave_valid_keys : 10\nenclave_valid : true\n");
    }

    #[test]
    fn test_report_invalid() {
        let report = enclave_info(&EnclaveStatus::new(10, 7)).unwrap();
        assert_eq!(report.as_str(), "enclave_valid_keys : 7\nenclave_valid : false\n");
    }

    #[test]
    fn test_widest_report_fits() {
        let report = enclave_info(&EnclaveStatus::new(u8::MAX, u8::MAX)).unwrap();
        assert_eq!(report.as_str(), "enclave_valid_keys : 255\nenclave_valid : false\n");
    }

    #[test]
    fn test_overflowing_writer_propagates_error() {
        let mut out = heapless::String::<16>::new();
        assert!(write_enclave_info(&EnclaveStatus::new(10, 10), &mut out).is_err());
    }

    #[test]
    fn test_validity() {
        assert!(EnclaveStatus::new(10, 10).is_valid());
        assert!(!EnclaveStatus::new(10, 9).is_valid());
        assert!(!EnclaveStatus::default().is_valid());
    }
}
