//! Decimal to Binary Conversion
//!
//! Converts a decimal character string into the nearest (under the active
//! rounding mode) value of a binary floating-point format.
//!
//! ## Input Grammar
//!
//! ```text
//! [+|-] digits [. digits] [(e|E) [+|-] digits]
//! [+|-] INF | INFINITY | NAN
//! ```
//!
//! Either digit sequence may be empty; an input with no digits at all is zero.
//!
//! ## Algorithm
//!
//! The decimal value is held exactly as a ratio of two malachite naturals.
//! A binary exponent is estimated from the bit lengths of numerator and
//! denominator and corrected until the integer quotient has exactly the
//! target precision; the remainder then decides rounding. Subnormal results
//! clamp the exponent to the format minimum before the division.

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

use std::cmp::Ordering;
use std::ops::{BitOr, BitOrAssign};

use malachite::base::num::arithmetic::traits::{DivRem, Parity, Pow, PowerOf2};
use malachite::base::num::basic::traits::{One, Zero};
use malachite::base::num::conversion::traits::WrappingFrom;
use malachite::base::num::logic::traits::SignificantBits;
use malachite::Natural;
use thiserror::Error;

use crate::binary_float::{BinaryFloat, BinaryPrecision};

/// Decimal exponents are clamped to this magnitude while parsing; anything
/// larger overflows or underflows every supported format anyway.
const EXPONENT_LIMIT: i64 = 1_000_000_000;

const LOG10_2: f64 = std::f64::consts::LOG10_2;

/// Rounding mode of a conversion (RN, RZ, RD, RU, RC edit modes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundingMode {
    /// RN: nearest, ties to even
    #[default]
    TiesToEven,
    /// RZ: toward zero
    ToZero,
    /// RD: toward negative infinity
    Down,
    /// RU: toward positive infinity
    Up,
    /// RC: nearest, ties away from zero
    TiesAwayFromZero,
}

/// Exception flags raised by a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConversionFlags(u8);

impl ConversionFlags {
    /// No exception
    pub const EXACT: ConversionFlags = ConversionFlags(0);
    /// Result overflowed to infinity or the largest finite value
    pub const OVERFLOW: ConversionFlags = ConversionFlags(1);
    /// Result is not exactly the decimal value
    pub const INEXACT: ConversionFlags = ConversionFlags(2);
    /// Input was not a number
    pub const INVALID: ConversionFlags = ConversionFlags(4);
    /// Result is tiny and inexact
    pub const UNDERFLOW: ConversionFlags = ConversionFlags(8);

    /// Check whether every flag in `other` is raised
    pub fn contains(self, other: ConversionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether no flag is raised
    pub fn is_exact(self) -> bool {
        self.0 == 0
    }

    /// Raw flag bits
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ConversionFlags {
    type Output = ConversionFlags;

    fn bitor(self, rhs: ConversionFlags) -> ConversionFlags {
        ConversionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConversionFlags {
    fn bitor_assign(&mut self, rhs: ConversionFlags) {
        self.0 |= rhs.0;
    }
}

/// Result of a decimal to binary conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionToBinaryResult {
    /// Converted value
    pub binary: BinaryFloat,
    /// Exceptions raised
    pub flags: ConversionFlags,
}

/// Malformed decimal input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    /// A character outside the grammar
    #[error("unexpected character '{ch}' at offset {offset} in decimal input")]
    UnexpectedCharacter {
        /// Offending character
        ch: char,
        /// Byte offset of the character
        offset: usize,
    },
    /// A word that is neither INF, INFINITY nor NAN
    #[error("'{0}' is not a recognized special value")]
    UnknownSpecial(String),
    /// An exponent letter with no digits after it
    #[error("exponent has no digits")]
    EmptyExponent,
}

/// Decimal-conversion service consumed by REAL input editing
///
/// Implementations must be pure: the same text, precision and rounding mode
/// always produce the same bits and flags.
pub trait DecimalToBinary: Send + Sync {
    /// Convert `text` to the nearest value of `precision` under `rounding`
    fn convert_to_binary(
        &self,
        precision: BinaryPrecision,
        text: &str,
        rounding: RoundingMode,
    ) -> ConversionToBinaryResult;
}

/// Exact decimal to binary converter on arbitrary-precision naturals
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConverter;

impl DecimalToBinary for DecimalConverter {
    fn convert_to_binary(
        &self,
        precision: BinaryPrecision,
        text: &str,
        rounding: RoundingMode,
    ) -> ConversionToBinaryResult {
        match parse_decimal(text) {
            Ok(DecimalValue::Finite {
                negative,
                digits,
                exponent,
            }) => round_to_binary(precision, negative, &digits, exponent, rounding),
            Ok(DecimalValue::Infinity { negative }) => ConversionToBinaryResult {
                binary: BinaryFloat::infinity(precision, negative),
                flags: ConversionFlags::EXACT,
            },
            Ok(DecimalValue::NaN { negative }) => ConversionToBinaryResult {
                binary: BinaryFloat::quiet_nan(precision, negative),
                flags: ConversionFlags::EXACT,
            },
            Err(_) => ConversionToBinaryResult {
                binary: BinaryFloat::quiet_nan(precision, false),
                flags: ConversionFlags::INVALID,
            },
        }
    }
}

/// A parsed decimal input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalValue {
    /// `digits * 10^exponent`
    Finite {
        /// Sign
        negative: bool,
        /// All significant digits as an integer
        digits: Natural,
        /// Power of ten applied to `digits`
        exponent: i64,
    },
    /// Signed infinity
    Infinity {
        /// Sign
        negative: bool,
    },
    /// Not a number
    NaN {
        /// Sign
        negative: bool,
    },
}

/// Parse decimal text into an exact value
///
/// # Errors
/// Returns a [`DecimalError`] for text outside the input grammar.
pub fn parse_decimal(text: &str) -> Result<DecimalValue, DecimalError> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut at = 0;
    let mut negative = false;
    if let Some(&sign) = bytes.first() {
        if sign == b'-' || sign == b'+' {
            negative = sign == b'-';
            at = 1;
        }
    }

    if bytes.get(at).is_some_and(|b| b.is_ascii_alphabetic()) {
        let word = text[at..].to_ascii_uppercase();
        return match word.as_str() {
            "INF" | "INFINITY" => Ok(DecimalValue::Infinity { negative }),
            "NAN" => Ok(DecimalValue::NaN { negative }),
            _ => Err(DecimalError::UnknownSpecial(text[at..].to_string())),
        };
    }

    let ten = Natural::from(10u32);
    let mut digits = Natural::ZERO;
    let mut exponent: i64 = 0;
    let mut seen_point = false;
    while let Some(&b) = bytes.get(at) {
        match b {
            b'0'..=b'9' => {
                digits *= &ten;
                digits += Natural::from(u32::from(b - b'0'));
                if seen_point {
                    exponent -= 1;
                }
            }
            b'.' if !seen_point => seen_point = true,
            _ => break,
        }
        at += 1;
    }

    if let Some(&b) = bytes.get(at) {
        if b != b'e' && b != b'E' {
            return Err(DecimalError::UnexpectedCharacter {
                ch: b as char,
                offset: at,
            });
        }
        at += 1;
        let mut negative_exponent = false;
        if let Some(&sign) = bytes.get(at) {
            if sign == b'-' || sign == b'+' {
                negative_exponent = sign == b'-';
                at += 1;
            }
        }
        let start = at;
        let mut explicit: i64 = 0;
        while let Some(&b) = bytes.get(at) {
            if !b.is_ascii_digit() {
                return Err(DecimalError::UnexpectedCharacter {
                    ch: b as char,
                    offset: at,
                });
            }
            explicit = (explicit * 10 + i64::from(b - b'0')).min(EXPONENT_LIMIT);
            at += 1;
        }
        if at == start {
            return Err(DecimalError::EmptyExponent);
        }
        exponent += if negative_exponent { -explicit } else { explicit };
    }

    Ok(DecimalValue::Finite {
        negative,
        digits,
        exponent,
    })
}

/// Round `digits * 10^exponent` into `precision`
pub fn round_to_binary(
    precision: BinaryPrecision,
    negative: bool,
    digits: &Natural,
    exponent: i64,
    rounding: RoundingMode,
) -> ConversionToBinaryResult {
    if *digits == Natural::ZERO {
        return ConversionToBinaryResult {
            binary: BinaryFloat::zero(precision, negative),
            flags: ConversionFlags::EXACT,
        };
    }

    let p = i64::from(precision.significand_precision());
    let bias = precision.exponent_bias();
    // Exponents of the least significant bit of a p-bit significand.
    let q_min = (1 - bias) - (p - 1);
    let q_max = bias - (p - 1);

    // Decimal magnitude: the value lies in [10^(magnitude-1), 10^magnitude).
    let magnitude = digits.to_string().len() as i64 + exponent;
    let overflow_magnitude = ((bias + 2) as f64 * LOG10_2).ceil() as i64 + 1;
    let underflow_magnitude = ((q_min - 2) as f64 * LOG10_2).floor() as i64 - 1;
    if magnitude > overflow_magnitude {
        return overflow(precision, negative, rounding);
    }
    if magnitude < underflow_magnitude {
        return tiny(precision, negative, rounding);
    }

    let ten = Natural::from(10u32);
    let (numerator, denominator) = if exponent >= 0 {
        (digits * (&ten).pow(exponent as u64), Natural::ONE)
    } else {
        (digits.clone(), (&ten).pow(exponent.unsigned_abs()))
    };

    let low_limit = Natural::power_of_2((p - 1) as u64);
    let high_limit = Natural::power_of_2(p as u64);
    let mut q = numerator.significant_bits() as i64 - denominator.significant_bits() as i64 - p;
    let (mut significand, mut remainder, mut divisor) = scaled_quotient(&numerator, &denominator, q);
    loop {
        if significand >= high_limit {
            q += 1;
        } else if significand < low_limit && q > q_min {
            q -= 1;
        } else {
            break;
        }
        (significand, remainder, divisor) = scaled_quotient(&numerator, &denominator, q);
    }
    if q < q_min {
        q = q_min;
        (significand, remainder, divisor) = scaled_quotient(&numerator, &denominator, q);
    }

    let inexact = remainder != Natural::ZERO;
    let half = (&remainder << 1u64).cmp(&divisor);
    let odd = (&significand).odd();
    let round_up = match rounding {
        RoundingMode::TiesToEven => half == Ordering::Greater || (half == Ordering::Equal && odd),
        RoundingMode::TiesAwayFromZero => inexact && half != Ordering::Less,
        RoundingMode::ToZero => false,
        RoundingMode::Up => inexact && !negative,
        RoundingMode::Down => inexact && negative,
    };
    if round_up {
        significand += Natural::ONE;
        if significand == high_limit {
            significand = low_limit.clone();
            q += 1;
        }
    }
    if q > q_max {
        return overflow(precision, negative, rounding);
    }

    let mut flags = ConversionFlags::EXACT;
    if inexact {
        flags |= ConversionFlags::INEXACT;
    }
    let significand = u128::wrapping_from(&significand);
    let normal_floor = 1u128 << ((p - 1) as u32);
    let binary = if significand < normal_floor {
        if inexact {
            flags |= ConversionFlags::UNDERFLOW;
        }
        BinaryFloat::from_parts(precision, negative, 0, significand)
    } else {
        let biased = (q + (p - 1) + bias) as u128;
        let field = if precision.has_explicit_integer_bit() {
            significand
        } else {
            significand - normal_floor
        };
        BinaryFloat::from_parts(precision, negative, biased, field)
    };
    ConversionToBinaryResult { binary, flags }
}

/// Quotient, remainder and divisor of `numerator / (denominator * 2^q)`
fn scaled_quotient(numerator: &Natural, denominator: &Natural, q: i64) -> (Natural, Natural, Natural) {
    if q >= 0 {
        let divisor = denominator << (q as u64);
        let (quotient, remainder) = numerator.div_rem(&divisor);
        (quotient, remainder, divisor)
    } else {
        let scaled = numerator << q.unsigned_abs();
        let (quotient, remainder) = scaled.div_rem(denominator);
        (quotient, remainder, denominator.clone())
    }
}

fn overflow(
    precision: BinaryPrecision,
    negative: bool,
    rounding: RoundingMode,
) -> ConversionToBinaryResult {
    let to_infinity = match rounding {
        RoundingMode::TiesToEven | RoundingMode::TiesAwayFromZero => true,
        RoundingMode::ToZero => false,
        RoundingMode::Up => !negative,
        RoundingMode::Down => negative,
    };
    let binary = if to_infinity {
        BinaryFloat::infinity(precision, negative)
    } else {
        BinaryFloat::max_finite(precision, negative)
    };
    ConversionToBinaryResult {
        binary,
        flags: ConversionFlags::OVERFLOW | ConversionFlags::INEXACT,
    }
}

/// A nonzero value below half the least subnormal
fn tiny(precision: BinaryPrecision, negative: bool, rounding: RoundingMode) -> ConversionToBinaryResult {
    let away = match rounding {
        RoundingMode::Up => !negative,
        RoundingMode::Down => negative,
        _ => false,
    };
    let binary = if away {
        BinaryFloat::from_parts(precision, negative, 0, 1)
    } else {
        BinaryFloat::zero(precision, negative)
    };
    ConversionToBinaryResult {
        binary,
        flags: ConversionFlags::UNDERFLOW | ConversionFlags::INEXACT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(text: &str) -> ConversionToBinaryResult {
        DecimalConverter.convert_to_binary(BinaryPrecision::Double, text, RoundingMode::TiesToEven)
    }

    fn single_with(text: &str, rounding: RoundingMode) -> f32 {
        DecimalConverter
            .convert_to_binary(BinaryPrecision::Single, text, rounding)
            .binary
            .to_f32()
            .unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            parse_decimal("-.125e2").unwrap(),
            DecimalValue::Finite {
                negative: true,
                digits: Natural::from(125u32),
                exponent: -1,
            }
        );
        assert_eq!(
            parse_decimal("infinity").unwrap(),
            DecimalValue::Infinity { negative: false }
        );
        assert_eq!(parse_decimal("-NAN").unwrap(), DecimalValue::NaN { negative: true });
        assert!(matches!(
            parse_decimal("FOO"),
            Err(DecimalError::UnknownSpecial(_))
        ));
        assert_eq!(parse_decimal("1e"), Err(DecimalError::EmptyExponent));
        assert!(matches!(
            parse_decimal("1.2.3"),
            Err(DecimalError::UnexpectedCharacter { ch: '.', offset: 3 })
        ));
    }

    #[test]
    fn test_exact_values() {
        let result = double(".15e1");
        assert_eq!(result.binary.to_f64(), Some(1.5));
        assert!(result.flags.is_exact());
        let result = double("-.25");
        assert_eq!(result.binary.to_f64(), Some(-0.25));
        assert!(result.flags.is_exact());
    }

    #[test]
    fn test_inexact_tenth() {
        let result = double(".1");
        assert_eq!(result.binary.to_f64(), Some(0.1));
        assert!(result.flags.contains(ConversionFlags::INEXACT));
    }

    #[test]
    fn test_zero_and_signed_zero() {
        let result = double("");
        assert!(result.binary.is_zero());
        assert!(!result.binary.is_negative());
        assert!(result.flags.is_exact());
        let result = double("-.000");
        assert!(result.binary.is_zero());
        assert!(result.binary.is_negative());
    }

    #[test]
    fn test_directed_rounding() {
        let nearest = single_with(".1", RoundingMode::TiesToEven);
        let down = single_with(".1", RoundingMode::Down);
        let up = single_with(".1", RoundingMode::Up);
        let zero = single_with(".1", RoundingMode::ToZero);
        assert!(down < up);
        assert_eq!(down, zero);
        assert!(nearest == down || nearest == up);
        assert_eq!(up.to_bits() - down.to_bits(), 1);
        let negative_down = single_with("-.1", RoundingMode::Down);
        assert_eq!(negative_down, -up);
    }

    #[test]
    fn test_ties() {
        // 2^24 + 1 lies exactly between two singles
        assert_eq!(single_with("16777217", RoundingMode::TiesToEven), 16777216.0);
        assert_eq!(
            single_with("16777217", RoundingMode::TiesAwayFromZero),
            16777218.0
        );
        // 2^24 + 3 ties upward to the even neighbour
        assert_eq!(single_with("16777219", RoundingMode::TiesToEven), 16777220.0);
    }

    #[test]
    fn test_overflow() {
        let result = double("1e400");
        assert_eq!(result.binary.to_f64(), Some(f64::INFINITY));
        assert!(result.flags.contains(ConversionFlags::OVERFLOW));
        let result =
            DecimalConverter.convert_to_binary(BinaryPrecision::Double, "1e400", RoundingMode::ToZero);
        assert_eq!(result.binary.to_f64(), Some(f64::MAX));
        let result = double("-1e999999999999");
        assert_eq!(result.binary.to_f64(), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_subnormal_and_underflow() {
        let result = double("4.9406564584124654e-324");
        assert_eq!(result.binary.to_f64(), Some(f64::from_bits(1)));
        assert!(result.flags.contains(ConversionFlags::UNDERFLOW));
        let result = double("1e-400");
        assert!(result.binary.is_zero());
        assert!(result.flags.contains(ConversionFlags::UNDERFLOW));
        let result =
            DecimalConverter.convert_to_binary(BinaryPrecision::Double, "1e-400", RoundingMode::Up);
        assert_eq!(result.binary.to_f64(), Some(f64::from_bits(1)));
        let result = double("2.2250738585072014e-308");
        assert_eq!(result.binary.to_f64(), Some(f64::MIN_POSITIVE));
    }

    #[test]
    fn test_half_and_bfloat() {
        let result =
            DecimalConverter.convert_to_binary(BinaryPrecision::Half, "1", RoundingMode::TiesToEven);
        assert_eq!(result.binary.bits(), 0x3C00);
        let result =
            DecimalConverter.convert_to_binary(BinaryPrecision::Half, "65504", RoundingMode::TiesToEven);
        assert_eq!(result.binary.bits(), 0x7BFF);
        let result = DecimalConverter.convert_to_binary(
            BinaryPrecision::Bfloat16,
            "-2",
            RoundingMode::TiesToEven,
        );
        assert_eq!(result.binary.bits(), 0xC000);
    }

    #[test]
    fn test_extended_and_quad() {
        let result = DecimalConverter.convert_to_binary(
            BinaryPrecision::Extended,
            "1",
            RoundingMode::TiesToEven,
        );
        assert_eq!(result.binary.bits(), 0x3FFF_8000_0000_0000_0000);
        let result =
            DecimalConverter.convert_to_binary(BinaryPrecision::Quad, "-1", RoundingMode::TiesToEven);
        assert_eq!(result.binary.bits(), 0xBFFF_u128 << 112);
    }

    #[test]
    fn test_invalid_input() {
        let result = double("1x");
        assert!(result.flags.contains(ConversionFlags::INVALID));
        assert!(result.binary.is_nan());
    }

    #[test]
    fn test_specials() {
        assert_eq!(double("-INF").binary.to_f64(), Some(f64::NEG_INFINITY));
        assert!(double("NaN").binary.is_nan());
    }
}
