// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel Enclave Check
//!
//! Provisions a simulated device with ten factory keys, derives the
//! verification records for them, then runs the enclave check and prints
//! the attestation report.
//!
//! ```text
//! enclave-check [--drop SLOT] [--corrupt SLOT] [--unique SLOT] [--verbose]
//! ```
//!
//! `--drop` leaves a factory slot unprovisioned, `--corrupt` provisions it
//! with the wrong key and `--unique` asks the enclave to make sure a unique
//! slot (11..=100) holds a key. The exit code is non-zero when the enclave
//! is not valid.

use std::process::ExitCode;
use std::sync::OnceLock;
use std::time::Instant;

use clap::Parser;
use q_common::constants::ENCLAVE_FACTORY_KEY_SLOTS;
use q_common::log::LogLevel;
use q_common::{CryptoEngineConfig, KeySize};
use q_enclave::{enclave_info, CryptoEngine, VerificationRecord, VerificationRecords};
use q_hal::sim::{simulated_device, SimRng};
use q_hal::RngInterface;

const RNG_SEED: u64 = 0x5EED_0000_C1A7;

#[derive(Parser, Debug)]
#[clap(name = "enclave-check", version, about = "Check the key enclave on a simulated device")]
struct Args {
    /// Leave this factory slot unprovisioned
    #[clap(long, value_name = "SLOT", value_parser = clap::value_parser!(u8).range(1..=100))]
    drop: Option<u8>,

    /// Provision this factory slot with the wrong key
    #[clap(long, value_name = "SLOT", value_parser = clap::value_parser!(u8).range(1..=100))]
    corrupt: Option<u8>,

    /// Make sure this slot holds a key after the check
    #[clap(long, value_name = "SLOT", value_parser = clap::value_parser!(u8).range(1..=100))]
    unique: Option<u8>,

    /// Record debug entries in the engine log
    #[clap(short, long, action)]
    verbose: bool,
}

/// Milliseconds since the check started
fn elapsed_ms() -> u32 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    u32::try_from(start.elapsed().as_millis()).unwrap_or(u32::MAX)
}

fn factory_keys() -> [[u8; 32]; 10] {
    let mut keys = [[0u8; 32]; 10];
    for (slot, key) in (1u8..).zip(keys.iter_mut()) {
        for (i, byte) in (0u8..).zip(key.iter_mut()) {
            *byte = slot.wrapping_mul(0x3B) ^ i.wrapping_mul(0x11);
        }
    }
    keys
}

fn config(verbose: bool) -> CryptoEngineConfig {
    let level = if verbose { LogLevel::Debug } else { LogLevel::Info };
    CryptoEngineConfig::DEFAULT
        .with_log_level(level)
        .with_tick_source(elapsed_ms)
}

/// Records a provisioning station would burn for `keys`
fn provisioning_records(keys: &[[u8; 32]; 10]) -> Result<VerificationRecords, String> {
    let (aes, link) = simulated_device();
    link.provision_factory_keys(keys);
    let station = CryptoEngine::new(aes, link, config(false));

    let mut records = [VerificationRecord {
        iv: [0; 16],
        input: [0; 16],
        expected: [0; 16],
    }; 10];
    for (slot, record) in (1u8..).zip(records.iter_mut()) {
        let iv = [slot ^ 0xA5; 16];
        let input = [slot.wrapping_mul(0x1F); 16];
        *record = station
            .enclave()
            .make_record(slot, &iv, &input)
            .map_err(|e| format!("record for slot {slot}: {e}"))?;
    }
    Ok(records)
}

fn run(args: &Args) -> Result<bool, String> {
    let keys = factory_keys();
    let records = provisioning_records(&keys)?;

    let (aes, link) = simulated_device();
    for (slot, key) in (1u8..=ENCLAVE_FACTORY_KEY_SLOTS).zip(keys.iter()) {
        if args.drop == Some(slot) {
            continue;
        }
        if args.corrupt == Some(slot) {
            link.provision(slot, KeySize::Aes256, &[0xEE; 32]);
        } else {
            link.provision(slot, KeySize::Aes256, key);
        }
    }

    let engine = CryptoEngine::new(aes, link, config(args.verbose))
        .with_verification_records(records);

    let status = engine.enclave().verify();
    let report = enclave_info(&status).map_err(|_| "report overflow".to_string())?;
    print!("{report}");

    if let Some(slot) = args.unique {
        let mut rng = SimRng::new(RNG_SEED);
        rng.init().map_err(|e| format!("rng: {e}"))?;
        let ready = engine.enclave().ensure_key(slot, &mut rng);
        println!("slot {slot} ready : {ready}");
    }

    engine.with_log(|log| {
        for entry in log.iter() {
            eprintln!("{entry}");
        }
    });

    Ok(status.is_valid())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("enclave-check: {message}");
            ExitCode::from(2)
        }
    }
}
