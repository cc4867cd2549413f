//! Binary Floating-Point Formats
//!
//! Describes the six REAL storage formats a data transfer may target and
//! holds a converted value as its raw bit pattern.
//!
//! ## Formats
//!
//! | Precision | Format      | Exponent bits | Significand field | Storage |
//! |-----------|-------------|---------------|-------------------|---------|
//! | 8         | bfloat16    | 8             | 7 (+ hidden bit)  | 2 bytes |
//! | 11        | IEEE half   | 5             | 10 (+ hidden bit) | 2 bytes |
//! | 24        | IEEE single | 8             | 23 (+ hidden bit) | 4 bytes |
//! | 53        | IEEE double | 11            | 52 (+ hidden bit) | 8 bytes |
//! | 64        | x87 extended| 15            | 64 (explicit)     | 10 bytes|
//! | 112       | IEEE quad   | 15            | 112 (+ hidden bit)| 16 bytes|

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

/// Target binary precision of a REAL conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryPrecision {
    /// bfloat16
    Bfloat16,
    /// IEEE 754 binary16
    Half,
    /// IEEE 754 binary32
    Single,
    /// IEEE 754 binary64
    Double,
    /// x87 80-bit extended precision
    Extended,
    /// IEEE 754 binary128
    Quad,
}

impl BinaryPrecision {
    /// All supported precisions, narrowest first
    pub const ALL: [BinaryPrecision; 6] = [
        BinaryPrecision::Bfloat16,
        BinaryPrecision::Half,
        BinaryPrecision::Single,
        BinaryPrecision::Double,
        BinaryPrecision::Extended,
        BinaryPrecision::Quad,
    ];

    /// Select a format by its binary precision (8, 11, 24, 53, 64 or 112)
    pub fn from_binary_precision(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(BinaryPrecision::Bfloat16),
            11 => Some(BinaryPrecision::Half),
            24 => Some(BinaryPrecision::Single),
            53 => Some(BinaryPrecision::Double),
            64 => Some(BinaryPrecision::Extended),
            112 => Some(BinaryPrecision::Quad),
            _ => None,
        }
    }

    /// Select a format from a REAL kind (storage bytes; 3 is bfloat16)
    pub fn from_real_kind(kind: usize) -> Option<Self> {
        match kind {
            2 => Some(BinaryPrecision::Half),
            3 => Some(BinaryPrecision::Bfloat16),
            4 => Some(BinaryPrecision::Single),
            8 => Some(BinaryPrecision::Double),
            10 => Some(BinaryPrecision::Extended),
            16 => Some(BinaryPrecision::Quad),
            _ => None,
        }
    }

    /// The binary precision selector of this format
    pub fn binary_precision(self) -> u32 {
        match self {
            BinaryPrecision::Bfloat16 => 8,
            BinaryPrecision::Half => 11,
            BinaryPrecision::Single => 24,
            BinaryPrecision::Double => 53,
            BinaryPrecision::Extended => 64,
            BinaryPrecision::Quad => 112,
        }
    }

    /// Significant bits carried by a normal value, hidden bit included
    pub fn significand_precision(self) -> u32 {
        if self.has_explicit_integer_bit() {
            self.significand_field_bits()
        } else {
            self.significand_field_bits() + 1
        }
    }

    /// Width of the stored significand field
    pub fn significand_field_bits(self) -> u32 {
        self.total_bits() - 1 - self.exponent_bits()
    }

    /// Width of the biased exponent field
    pub fn exponent_bits(self) -> u32 {
        match self {
            BinaryPrecision::Bfloat16 => 8,
            BinaryPrecision::Half => 5,
            BinaryPrecision::Single => 8,
            BinaryPrecision::Double => 11,
            BinaryPrecision::Extended => 15,
            BinaryPrecision::Quad => 15,
        }
    }

    /// Total width of the encoding
    pub fn total_bits(self) -> u32 {
        match self {
            BinaryPrecision::Bfloat16 | BinaryPrecision::Half => 16,
            BinaryPrecision::Single => 32,
            BinaryPrecision::Double => 64,
            BinaryPrecision::Extended => 80,
            BinaryPrecision::Quad => 128,
        }
    }

    /// Bytes of storage occupied by one value
    pub fn storage_bytes(self) -> usize {
        (self.total_bits() / 8) as usize
    }

    /// The x87 format stores its leading significand bit explicitly
    pub fn has_explicit_integer_bit(self) -> bool {
        self == BinaryPrecision::Extended
    }

    /// Exponent bias
    pub fn exponent_bias(self) -> i64 {
        (1i64 << (self.exponent_bits() - 1)) - 1
    }

    /// Largest biased exponent of a finite value
    pub fn max_biased_exponent(self) -> u128 {
        (1u128 << self.exponent_bits()) - 2
    }

    /// Maximum number of significant decimal digits that can affect a
    /// correctly rounded conversion into this format
    pub fn max_decimal_conversion_digits(self) -> usize {
        match self {
            BinaryPrecision::Bfloat16 => 96,
            BinaryPrecision::Half => 21,
            BinaryPrecision::Single => 112,
            BinaryPrecision::Double => 767,
            BinaryPrecision::Extended => 11514,
            BinaryPrecision::Quad => 11563,
        }
    }
}

/// A REAL value held as its raw encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryFloat {
    precision: BinaryPrecision,
    bits: u128,
}

impl BinaryFloat {
    /// Wrap a raw bit pattern (bits above the format width are dropped)
    pub fn from_bits(precision: BinaryPrecision, bits: u128) -> Self {
        let width = precision.total_bits();
        let bits = if width >= 128 {
            bits
        } else {
            bits & ((1u128 << width) - 1)
        };
        Self { precision, bits }
    }

    /// Assemble a value from sign, biased exponent and significand field
    pub fn from_parts(
        precision: BinaryPrecision,
        negative: bool,
        biased_exponent: u128,
        significand_field: u128,
    ) -> Self {
        let field_bits = precision.significand_field_bits();
        let sign = if negative {
            1u128 << (precision.total_bits() - 1)
        } else {
            0
        };
        let field_mask = (1u128 << field_bits) - 1;
        Self::from_bits(
            precision,
            sign | (biased_exponent << field_bits) | (significand_field & field_mask),
        )
    }

    /// Signed zero
    pub fn zero(precision: BinaryPrecision, negative: bool) -> Self {
        Self::from_parts(precision, negative, 0, 0)
    }

    /// Signed infinity
    pub fn infinity(precision: BinaryPrecision, negative: bool) -> Self {
        let field = if precision.has_explicit_integer_bit() {
            1u128 << (precision.significand_field_bits() - 1)
        } else {
            0
        };
        Self::from_parts(
            precision,
            negative,
            precision.max_biased_exponent() + 1,
            field,
        )
    }

    /// Quiet NaN
    pub fn quiet_nan(precision: BinaryPrecision, negative: bool) -> Self {
        let field_bits = precision.significand_field_bits();
        let mut field = 1u128 << (field_bits - 1);
        if precision.has_explicit_integer_bit() {
            field |= 1u128 << (field_bits - 2);
        }
        Self::from_parts(
            precision,
            negative,
            precision.max_biased_exponent() + 1,
            field,
        )
    }

    /// Largest finite magnitude
    pub fn max_finite(precision: BinaryPrecision, negative: bool) -> Self {
        let field_bits = precision.significand_field_bits();
        Self::from_parts(
            precision,
            negative,
            precision.max_biased_exponent(),
            (1u128 << field_bits) - 1,
        )
    }

    /// Format of this value
    pub fn precision(&self) -> BinaryPrecision {
        self.precision
    }

    /// Raw encoding, right-aligned
    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// Sign bit
    pub fn is_negative(&self) -> bool {
        (self.bits >> (self.precision.total_bits() - 1)) & 1 == 1
    }

    /// Biased exponent field
    pub fn biased_exponent(&self) -> u128 {
        let field_bits = self.precision.significand_field_bits();
        (self.bits >> field_bits) & ((1u128 << self.precision.exponent_bits()) - 1)
    }

    /// Stored significand field
    pub fn significand_field(&self) -> u128 {
        self.bits & ((1u128 << self.precision.significand_field_bits()) - 1)
    }

    /// Check for positive or negative zero
    pub fn is_zero(&self) -> bool {
        self.biased_exponent() == 0 && self.significand_field() == 0
    }

    /// Check for infinity
    pub fn is_infinite(&self) -> bool {
        if self.biased_exponent() != self.precision.max_biased_exponent() + 1 {
            return false;
        }
        let field = self.significand_field();
        if self.precision.has_explicit_integer_bit() {
            field == 1u128 << (self.precision.significand_field_bits() - 1)
        } else {
            field == 0
        }
    }

    /// Check for NaN
    pub fn is_nan(&self) -> bool {
        self.biased_exponent() == self.precision.max_biased_exponent() + 1 && !self.is_infinite()
    }

    /// Storage bytes in native byte order
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let bytes = self.precision.storage_bytes();
        let all = self.bits.to_ne_bytes();
        if cfg!(target_endian = "little") {
            all[..bytes].to_vec()
        } else {
            all[16 - bytes..].to_vec()
        }
    }

    /// Reinterpret as `f32` (single precision only)
    pub fn to_f32(&self) -> Option<f32> {
        match self.precision {
            BinaryPrecision::Single => Some(f32::from_bits(self.bits as u32)),
            _ => None,
        }
    }

    /// Reinterpret as `f64` (double precision only)
    pub fn to_f64(&self) -> Option<f64> {
        match self.precision {
            BinaryPrecision::Double => Some(f64::from_bits(self.bits as u64)),
            _ => None,
        }
    }
}

impl From<f32> for BinaryFloat {
    fn from(value: f32) -> Self {
        Self::from_bits(BinaryPrecision::Single, value.to_bits() as u128)
    }
}

impl From<f64> for BinaryFloat {
    fn from(value: f64) -> Self {
        Self::from_bits(BinaryPrecision::Double, value.to_bits() as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_table() {
        for precision in BinaryPrecision::ALL {
            assert_eq!(
                BinaryPrecision::from_binary_precision(precision.binary_precision()),
                Some(precision)
            );
        }
        assert_eq!(BinaryPrecision::Double.significand_precision(), 53);
        assert_eq!(BinaryPrecision::Extended.significand_precision(), 64);
        assert_eq!(BinaryPrecision::Quad.significand_precision(), 113);
        assert_eq!(BinaryPrecision::Half.exponent_bias(), 15);
        assert_eq!(BinaryPrecision::Extended.storage_bytes(), 10);
        assert_eq!(BinaryPrecision::from_binary_precision(32), None);
    }

    #[test]
    fn test_specials_match_native() {
        assert_eq!(
            BinaryFloat::infinity(BinaryPrecision::Double, false).to_f64(),
            Some(f64::INFINITY)
        );
        assert_eq!(
            BinaryFloat::infinity(BinaryPrecision::Single, true).to_f32(),
            Some(f32::NEG_INFINITY)
        );
        assert_eq!(
            BinaryFloat::max_finite(BinaryPrecision::Double, false).to_f64(),
            Some(f64::MAX)
        );
        assert!(BinaryFloat::quiet_nan(BinaryPrecision::Single, false)
            .to_f32()
            .unwrap()
            .is_nan());
        assert_eq!(
            BinaryFloat::zero(BinaryPrecision::Double, true).bits(),
            (-0.0f64).to_bits() as u128
        );
    }

    #[test]
    fn test_extended_specials() {
        let inf = BinaryFloat::infinity(BinaryPrecision::Extended, false);
        assert_eq!(inf.bits(), 0x7FFF_8000_0000_0000_0000);
        assert!(inf.is_infinite());
        let nan = BinaryFloat::quiet_nan(BinaryPrecision::Extended, false);
        assert_eq!(nan.bits(), 0x7FFF_C000_0000_0000_0000);
        assert!(nan.is_nan());
    }

    #[test]
    fn test_from_native() {
        let value = BinaryFloat::from(1.5f64);
        assert_eq!(value.biased_exponent(), 1023);
        assert!(!value.is_negative());
        assert_eq!(value.to_ne_bytes(), 1.5f64.to_ne_bytes().to_vec());
    }
}
