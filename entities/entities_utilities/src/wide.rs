//! Wide Unsigned Accumulator
//!
//! Accumulates digit strings of unbounded length into a fixed-width unsigned
//! value with two's complement wraparound at 128 bits.
//!
//! The accumulator lives on the stack of a single field conversion and is
//! never shared. Narrowing to a smaller INTEGER kind truncates the low-order
//! bits and sign-extends the result, matching the storage behaviour of an
//! INTEGER(KIND=k) item.

/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright Lee Barney 2025. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

/// Fixed-width unsigned accumulator
///
/// Every step wraps modulo 2^128, so an arbitrarily long digit string keeps
/// the exact low-order 128 bits of its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WideUnsigned {
    value: u128,
}

impl WideUnsigned {
    /// Width of the accumulator in bits
    pub const BITS: u32 = u128::BITS;

    /// Create a zero accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator holding `value`
    pub fn from_u128(value: u128) -> Self {
        Self { value }
    }

    /// Accumulate one digit: `value = value * base + digit`
    ///
    /// # Arguments
    /// * `base` - Radix of the digit string (2, 8, 10 or 16)
    /// * `digit` - Digit value, already validated against `base`
    pub fn multiply_add(&mut self, base: u32, digit: u32) {
        self.value = self
            .value
            .wrapping_mul(u128::from(base))
            .wrapping_add(u128::from(digit));
    }

    /// Check whether the accumulated value is zero
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Low 128 bits of the accumulated value
    pub fn low_u128(&self) -> u128 {
        self.value
    }

    /// Two's complement negation at the full accumulator width
    pub fn negated(&self) -> u128 {
        self.value.wrapping_neg()
    }

    /// Apply a sign and narrow to an INTEGER kind
    ///
    /// The result is the value an INTEGER(KIND=`kind`) item holds after the
    /// low `8 * kind` bits are stored, sign-extended back to `i128`.
    ///
    /// # Arguments
    /// * `negative` - Whether a minus sign was scanned
    /// * `kind` - INTEGER kind in bytes (1, 2, 4, 8 or 16)
    ///
    /// # Returns
    /// * `Some(value)` - The narrowed value
    /// * `None` - If `kind` is not a supported INTEGER kind
    pub fn to_integer_kind(&self, negative: bool, kind: usize) -> Option<i128> {
        let raw = if negative {
            self.negated()
        } else {
            self.low_u128()
        };
        match kind {
            1 => Some(raw as u8 as i8 as i128),
            2 => Some(raw as u16 as i16 as i128),
            4 => Some(raw as u32 as i32 as i128),
            8 => Some(raw as u64 as i64 as i128),
            16 => Some(raw as i128),
            _ => None,
        }
    }
}
