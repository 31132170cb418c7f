// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for q-hal
//!
//! Tests for platform detection, error handling, the AES control word and
//! the simulator's register-level behaviour. Register drivers cannot run on
//! the host; these exercise the platform-agnostic layer and the models.

mod platform_tests {
    use q_hal::Platform;

    #[test]
    fn test_platform_detection_returns_valid_variant() {
        let platform = Platform::current();
        assert!(matches!(
            platform,
            Platform::Stm32Wb | Platform::Simulator | Platform::Unknown
        ));
    }

    #[test]
    fn test_coprocessor_availability_by_platform() {
        assert!(Platform::Stm32Wb.has_coprocessor());
        assert!(Platform::Simulator.has_coprocessor());
        assert!(!Platform::Unknown.has_coprocessor());
    }

    #[test]
    fn test_aes_base_address() {
        assert_eq!(Platform::Stm32Wb.aes_base(), 0x5006_0000);
        assert_eq!(Platform::Unknown.aes_base(), 0);
    }
}

mod error_tests {
    use q_hal::HalError;

    #[test]
    fn test_error_display_format() {
        assert_eq!(format!("{}", HalError::Timeout), "[0x08F1] timeout");
    }

    #[test]
    fn test_error_codes_in_hal_range() {
        for e in [
            HalError::NotInitialized,
            HalError::InitFailed,
            HalError::RngError,
            HalError::InvalidParameter,
            HalError::Timeout,
            HalError::Busy,
            HalError::NotSupported,
            HalError::InvalidState,
            HalError::CryptoError,
            HalError::HardwareFault,
        ] {
            assert_eq!(e.code() >> 8, 0x08, "{e}");
        }
    }

    #[test]
    fn test_conversion_to_common_error() {
        assert_eq!(q_common::Error::from(HalError::Timeout), q_common::Error::Timeout);
        assert_eq!(q_common::Error::from(HalError::RngError), q_common::Error::RngFailure);
        assert_eq!(
            q_common::Error::from(HalError::CryptoError),
            q_common::Error::PeripheralError
        );
    }
}

mod control_tests {
    use q_common::KeySize;
    use q_hal::{AesControl, ChainingMode, GcmPhase, LinkStatus, OperatingMode};

    #[test]
    fn test_control_builder() {
        let ctrl = AesControl::new(ChainingMode::Ctr, KeySize::Aes128);
        assert_eq!(ctrl.mode, OperatingMode::Encrypt);
        assert_eq!(ctrl.phase, GcmPhase::Init);
        assert_eq!(ctrl.padding_bytes, 0);

        let ctrl = ctrl.with_mode(OperatingMode::Decrypt).with_padding(3);
        assert_eq!(ctrl.mode, OperatingMode::Decrypt);
        assert_eq!(ctrl.padding_bytes, 3);
    }

    #[test]
    fn test_gcm_phases_are_ordered() {
        assert!(GcmPhase::Init < GcmPhase::Header);
        assert!(GcmPhase::Header < GcmPhase::Payload);
        assert!(GcmPhase::Payload < GcmPhase::Final);
    }

    #[test]
    fn test_link_status() {
        assert!(LinkStatus::Ok.is_ok());
        assert!(!LinkStatus::Busy.is_ok());
        assert!(!LinkStatus::Unavailable.is_ok());
    }
}

mod sim_tests {
    use aes::cipher::generic_array::GenericArray;
    use aes::cipher::{BlockEncrypt, KeyInit};
    use aes::Aes256;
    use q_common::KeySize;
    use q_hal::sim::{simulated_device, SimRng, SoftAes};
    use q_hal::{
        wait_cycles, AesControl, AesPeripheral, ChainingMode, CoprocessorLink, HalError,
        HalResult, LinkStatus, RngInterface,
    };
    use std::cell::Cell;

    fn be_words(bytes: &[u8]) -> [u32; 4] {
        let mut out = [0u32; 4];
        for (w, c) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            *w = u32::from_be_bytes([c[0], c[1], c[2], c[3]]);
        }
        out
    }

    fn be_bytes(words: &[u32; 4]) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (c, w) in out.chunks_exact_mut(4).zip(words) {
            c.copy_from_slice(&w.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_ctr_counter_increments_low_word() {
        let key = [0x42u8; 32];
        let (mut aes, mut link) = simulated_device();
        link.provision(11, KeySize::Aes256, &key);
        aes.enable_clock();
        aes.set_mode(AesControl::new(ChainingMode::Ctr, KeySize::Aes256));
        assert_eq!(link.load_key(11), LinkStatus::Ok);

        let mut iv = [0u8; 16];
        iv[15] = 1;
        aes.write_iv(&be_words(&iv));
        aes.set_enabled(true);

        let cipher = Aes256::new(GenericArray::from_slice(&key));
        for counter in 1u8..=3 {
            aes.push_block(&[0; 4]);
            assert!(aes.wait_ready(10).is_ok());
            let ks = be_bytes(&aes.pop_block());
            aes.clear_ready();

            let mut expected = [0u8; 16];
            expected[15] = counter;
            let mut block = GenericArray::clone_from_slice(&expected);
            cipher.encrypt_block(&mut block);
            assert_eq!(&ks[..], block.as_slice());
        }
    }

    #[test]
    fn test_wait_ready_times_out_when_stalled() {
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_stalled(true);
        aes.set_enabled(true);
        aes.push_block(&[0; 4]);
        assert_eq!(aes.wait_ready(100), Err(HalError::Timeout));
    }

    fn stalled_aes() -> SoftAes {
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_stalled(true);
        aes.set_enabled(true);
        aes.push_block(&[0; 4]);
        aes
    }

    /// Cycle counter that advances 1000 cycles per read
    fn run_stalled_wait(start: u32) -> (HalResult<()>, u32) {
        let mut aes = stalled_aes();
        let cycles = Cell::new(start);
        let reads = Cell::new(0u32);
        let result = wait_cycles(&mut aes, 64_000, || {
            reads.set(reads.get() + 1);
            let now = cycles.get();
            cycles.set(now.wrapping_add(1_000));
            now
        });
        (result, reads.get())
    }

    #[test]
    fn test_wait_cycles_times_out_on_cycle_budget() {
        let (result, reads) = run_stalled_wait(0);
        assert_eq!(result, Err(HalError::Timeout));
        assert_eq!(reads, 65);
    }

    #[test]
    fn test_wait_cycles_survives_counter_wraparound() {
        let (result, reads) = run_stalled_wait(u32::MAX - 500);
        assert_eq!(result, Err(HalError::Timeout));
        assert_eq!(reads, 65);
    }

    #[test]
    fn test_wait_cycles_returns_once_ready() {
        let mut aes = SoftAes::new();
        aes.enable_clock();
        aes.set_mode(AesControl::new(ChainingMode::Ecb, KeySize::Aes256));
        aes.write_key(&[0x0102_0304; 8]);
        aes.set_enabled(true);
        aes.push_block(&[0; 4]);
        assert_eq!(wait_cycles(&mut aes, 64_000, || 0), Ok(()));
        assert!(aes.is_ready());
    }

    #[test]
    fn test_clock_gating() {
        let mut aes = SoftAes::new();
        assert!(!aes.is_clock_enabled());
        aes.enable_clock();
        assert!(aes.is_clock_enabled());
        aes.disable_clock();
        assert!(!aes.is_clock_enabled());
    }

    #[test]
    fn test_failing_loads_and_counters() {
        let (_aes, mut link) = simulated_device();
        link.provision(2, KeySize::Aes256, &[1u8; 32]);
        link.fail_loads_for(2);
        assert_eq!(link.load_key(2), LinkStatus::Busy);
        link.clear_load_failures();
        assert_eq!(link.load_key(2), LinkStatus::Ok);
        assert_eq!(link.load_count(), 1);
        assert_eq!(link.occupied_slots(), 1);
    }

    #[test]
    fn test_store_budget() {
        let (_aes, mut link) = simulated_device();
        link.fail_stores_after(1);
        let data = [3u8; 32];
        let key = q_common::CryptoKey::new(q_common::KeyType::Simple, KeySize::Aes256, &data);
        assert_eq!(link.store_key(&key), Ok(1));
        assert_eq!(link.store_key(&key), Err(LinkStatus::Busy));
        assert_eq!(link.store_count(), 1);
    }

    #[test]
    fn test_sim_rng_failure_injection() {
        let mut rng = SimRng::new(7);
        rng.init().ok();
        rng.set_failing(true);
        let mut buf = [0u8; 32];
        assert_eq!(rng.fill_bytes(&mut buf), Err(HalError::RngError));
    }
}
