// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Secure memory utilities
//!
//! Zeroization of output buffers and key scratch space, and the
//! constant-time comparison used for GCM tag checks.

use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};
use zeroize::Zeroize;

/// Securely zero memory, preventing compiler optimization
///
/// Used on every CTR/GCM failure path so a partially produced output never
/// reaches the caller.
#[inline(never)]
pub fn secure_zero(data: &mut [u8]) {
    for byte in data.iter_mut() {
        // SAFETY: `byte` is a valid, exclusively borrowed u8
        unsafe {
            ptr::write_volatile(byte, 0);
        }
    }

    compiler_fence(Ordering::SeqCst);
}

/// Securely zero a register word image
#[inline(never)]
pub fn secure_zero_words(words: &mut [u32]) {
    for word in words.iter_mut() {
        // SAFETY: `word` is a valid, exclusively borrowed u32
        unsafe {
            ptr::write_volatile(word, 0);
        }
    }

    compiler_fence(Ordering::SeqCst);
}

/// Fixed-size key scratch buffer that zeroizes on drop
pub struct KeyBuffer<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> KeyBuffer<N> {
    /// Create a zeroed buffer
    #[must_use]
    pub const fn new() -> Self {
        Self { data: [0u8; N] }
    }

    /// Key bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Key bytes, for filling from an RNG
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const N: usize> Default for KeyBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Zeroize for KeyBuffer<N> {
    fn zeroize(&mut self) {
        secure_zero(&mut self.data);
    }
}

impl<const N: usize> Drop for KeyBuffer<N> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Compare two byte slices in constant time
///
/// Every byte pair is visited; differences are OR-accumulated.
#[must_use]
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
