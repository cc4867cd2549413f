//! Numeric Field Scanner
//!
//! Character-level recognition of INTEGER and REAL input fields. The scanner
//! consumes one field through a [`FieldSource`] and produces either a wide
//! unsigned magnitude (integers and BOZ bit patterns) or a sign, significant
//! digit string and decimal exponent (reals).
//!
//! ## Field rules
//!
//! - Leading blanks are skipped and one `+` or `-` is taken as the sign.
//! - Interior blanks are ignored, or read as `0` under BZ.
//! - With no decimal point in a REAL field, the last `d` digits are the
//!   fraction; the `kP` scale factor applies only without an exponent.
//! - Leading zeros are dropped; zeros between the decimal point and the first
//!   significant digit lower the exponent instead.

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

use entities_io_operations::{DataEdit, FieldSource, IoFault, MutableModes};
use entities_utilities::WideUnsigned;

/// Explicit exponents saturate at this magnitude
const EXPONENT_LIMIT: i64 = 1_000_000_000;

/// Cursor state after the sign of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericPrefix {
    /// A `-` sign was consumed
    pub negative: bool,
    /// First character after the sign, `None` for an empty field
    pub next: Option<char>,
    /// Width budget left, `None` for list-directed fields
    pub remaining: Option<usize>,
}

/// Skip leading blanks and consume an optional sign
///
/// # Arguments
/// * `io` - Character source of the statement
/// * `edit` - Edit descriptor of the field
pub fn scan_numeric_prefix<S>(io: &mut S, edit: &DataEdit) -> Result<NumericPrefix, IoFault>
where
    S: FieldSource + ?Sized,
{
    let mut remaining = match edit.width {
        Some(width) if !edit.is_list_directed() => Some(width),
        _ => {
            io.skip_spaces();
            None
        }
    };
    let mut next = io.next_in_field(&mut remaining, &edit.modes)?;
    while next == Some(' ') {
        next = io.next_in_field(&mut remaining, &edit.modes)?;
    }
    let mut negative = false;
    if let Some(ch) = next {
        if ch == '-' || ch == '+' {
            negative = ch == '-';
            next = io.next_in_field(&mut remaining, &edit.modes)?;
        }
    }
    Ok(NumericPrefix {
        negative,
        next,
        remaining,
    })
}

/// Value of `ch` as a digit in `base`, if it is one
///
/// Hexadecimal letters are `A`-`F` in either case.
pub fn digit_value(ch: char, base: u32) -> Option<u32> {
    let value = if ('0'..='9').contains(&ch) {
        ch as u32 - '0' as u32
    } else if ('A'..='F').contains(&ch) {
        ch as u32 - 'A' as u32 + 10
    } else if ('a'..='f').contains(&ch) {
        ch as u32 - 'a' as u32 + 10
    } else {
        return None;
    };
    (value < base).then_some(value)
}

/// Scanned INTEGER or bit-pattern field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedInteger {
    /// A `-` sign was consumed
    pub negative: bool,
    /// Magnitude, wrapped at 128 bits
    pub magnitude: WideUnsigned,
}

/// Scan the digits of an integer field in `base`
///
/// # Arguments
/// * `io` - Character source of the statement
/// * `edit` - Edit descriptor of the field
/// * `base` - Radix: 2, 8, 10 or 16
///
/// # Returns
/// The sign and magnitude, or `IoFault::BadDigit` for a character outside
/// the base
pub fn scan_integer<S>(io: &mut S, edit: &DataEdit, base: u32) -> Result<ScannedInteger, IoFault>
where
    S: FieldSource + ?Sized,
{
    let prefix = scan_numeric_prefix(io, edit)?;
    let mut next = prefix.next;
    let mut remaining = prefix.remaining;
    let mut magnitude = WideUnsigned::new();
    while let Some(mut ch) = next {
        if ch == ' ' {
            if !edit.modes.blank_zero {
                next = io.next_in_field(&mut remaining, &edit.modes)?;
                continue;
            }
            ch = '0';
        }
        let digit = digit_value(ch, base).ok_or(IoFault::BadDigit { ch })?;
        magnitude.multiply_add(base, digit);
        next = io.next_in_field(&mut remaining, &edit.modes)?;
    }
    check_record_end(io, remaining);
    Ok(ScannedInteger {
        negative: prefix.negative,
        magnitude,
    })
}

/// Scanned REAL field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedReal {
    /// Blank field: exact positive zero
    Empty,
    /// `.digits * 10^exponent`; `digits` holds no leading zeros
    Finite {
        negative: bool,
        digits: String,
        exponent: i64,
        /// Significant digits were dropped past the digit limit
        truncated: bool,
    },
    Infinity {
        negative: bool,
    },
    NaN {
        negative: bool,
    },
}

impl ScannedReal {
    /// Normalised decimal text for the conversion service
    ///
    /// Sign, `.`, the significant digits, then `e<exponent>` when nonzero;
    /// specials are spelled `INF` and `NAN`.
    pub fn to_decimal_text(&self) -> String {
        match self {
            ScannedReal::Empty => ".".to_string(),
            ScannedReal::Finite {
                negative,
                digits,
                exponent,
                ..
            } => {
                let sign = if *negative { "-" } else { "" };
                if *exponent != 0 {
                    format!("{sign}.{digits}e{exponent}")
                } else {
                    format!("{sign}.{digits}")
                }
            }
            ScannedReal::Infinity { negative } => {
                format!("{}INF", if *negative { "-" } else { "" })
            }
            ScannedReal::NaN { negative } => {
                format!("{}NAN", if *negative { "-" } else { "" })
            }
        }
    }
}

/// Scan a REAL field in decimal form
///
/// # Arguments
/// * `io` - Character source of the statement
/// * `edit` - Edit descriptor of the field
/// * `max_digits` - Significant digits kept; later ones are dropped
pub fn scan_real<S>(io: &mut S, edit: &DataEdit, max_digits: usize) -> Result<ScannedReal, IoFault>
where
    S: FieldSource + ?Sized,
{
    let prefix = scan_numeric_prefix(io, edit)?;
    let negative = prefix.negative;
    let mut remaining = prefix.remaining;
    let Some(first) = prefix.next else {
        check_record_end(io, remaining);
        return Ok(ScannedReal::Empty);
    };

    if first.is_ascii_alphabetic() {
        return scan_special(io, first, negative, &mut remaining, &edit.modes);
    }

    let decimal = if edit.modes.decimal_comma { ',' } else { '.' };
    if first != decimal && !first.is_ascii_digit() {
        return Err(IoFault::BadRealInput);
    }

    let mut digits = String::new();
    let mut significant: i64 = 0;
    let mut decimal_point: Option<i64> = None;
    let mut skipped_fraction_zeros: i64 = 0;
    let mut next = Some(first);
    while let Some(mut ch) = next {
        if ch == ' ' {
            if !edit.modes.blank_zero {
                next = io.next_in_field(&mut remaining, &edit.modes)?;
                continue;
            }
            ch = '0';
        }
        if ch == '0' && significant == 0 {
            if decimal_point.is_some() {
                skipped_fraction_zeros += 1;
            }
        } else if ch.is_ascii_digit() {
            if digits.len() < max_digits {
                digits.push(ch);
            }
            significant += 1;
        } else if ch == decimal && decimal_point.is_none() {
            decimal_point = Some(significant);
        } else {
            break;
        }
        next = io.next_in_field(&mut remaining, &edit.modes)?;
    }

    if matches!(next, Some('e' | 'E' | 'd' | 'D' | 'q' | 'Q')) {
        next = io.next_in_field(&mut remaining, &edit.modes)?;
        while next == Some(' ') {
            next = io.next_in_field(&mut remaining, &edit.modes)?;
        }
    }
    let mut exponent = -i64::from(edit.modes.scale);
    if let Some(ch @ ('-' | '+' | '0'..='9')) = next {
        let negative_exponent = ch == '-';
        if ch == '-' || ch == '+' {
            next = io.next_in_field(&mut remaining, &edit.modes)?;
        }
        exponent = 0;
        while let Some(ch) = next {
            let digit = match ch {
                '0'..='9' => i64::from(ch as u8 - b'0'),
                ' ' if edit.modes.blank_zero => 0,
                ' ' => {
                    next = io.next_in_field(&mut remaining, &edit.modes)?;
                    continue;
                }
                _ => break,
            };
            exponent = (exponent * 10 + digit).min(EXPONENT_LIMIT);
            next = io.next_in_field(&mut remaining, &edit.modes)?;
        }
        if negative_exponent {
            exponent = -exponent;
        }
    }
    exponent += match decimal_point {
        Some(point) => point - skipped_fraction_zeros,
        None => significant - edit.digits.unwrap_or(0) as i64,
    };

    if let Some(ch) = next {
        reject_trailing(io, ch, &mut remaining, &edit.modes)?;
    }
    check_record_end(io, remaining);

    if significant == 0 {
        return Ok(ScannedReal::Finite {
            negative,
            digits,
            exponent: 0,
            truncated: false,
        });
    }
    Ok(ScannedReal::Finite {
        negative,
        truncated: significant as usize > max_digits,
        digits,
        exponent,
    })
}

fn scan_special<S>(
    io: &mut S,
    first: char,
    negative: bool,
    remaining: &mut Option<usize>,
    modes: &MutableModes,
) -> Result<ScannedReal, IoFault>
where
    S: FieldSource + ?Sized,
{
    let mut word = String::new();
    let mut next = Some(first);
    while let Some(ch) = next.filter(char::is_ascii_alphabetic) {
        word.push(ch.to_ascii_uppercase());
        next = io.next_in_field(remaining, modes)?;
    }
    let scanned = match word.as_str() {
        "INF" | "INFINITY" => ScannedReal::Infinity { negative },
        "NAN" => {
            // payload is discarded
            if next.is_none() && remaining.is_none() && io.current_char() == Some('(') {
                while let Some(ch) = io.current_char() {
                    io.handle_relative_position(1);
                    if ch == ')' {
                        break;
                    }
                }
            } else if next == Some('(') {
                next = io.next_in_field(remaining, modes)?;
                while let Some(ch) = next {
                    next = io.next_in_field(remaining, modes)?;
                    if ch == ')' {
                        break;
                    }
                }
            }
            ScannedReal::NaN { negative }
        }
        _ => return Err(IoFault::BadRealInput),
    };
    if let Some(ch) = next {
        reject_trailing(io, ch, remaining, modes)?;
    }
    check_record_end(io, *remaining);
    Ok(scanned)
}

/// Accept trailing blanks in the rest of the field; anything else is a
/// format mismatch
fn reject_trailing<S>(
    io: &mut S,
    first: char,
    remaining: &mut Option<usize>,
    modes: &MutableModes,
) -> Result<(), IoFault>
where
    S: FieldSource + ?Sized,
{
    let mut next = Some(first);
    while let Some(ch) = next {
        if ch != ' ' {
            return Err(IoFault::TrailingCharacters { ch, item: "REAL" });
        }
        if remaining.is_none() {
            break;
        }
        next = io.next_in_field(remaining, modes)?;
    }
    Ok(())
}

/// A field cut short by the end of a non-advancing record reports EOR
fn check_record_end<S>(io: &mut S, remaining: Option<usize>)
where
    S: FieldSource + ?Sized,
{
    if remaining.is_some_and(|left| left > 0) && io.connection().non_advancing {
        tracing::debug!(left = ?remaining, "field ended at end of record");
        io.error_handler().signal_eor();
    }
}
