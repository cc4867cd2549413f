//! REAL Input Editing
//!
//! Converts one input field into a REAL item of any supported binary format.
//!
//! Decimal fields are scanned into normalised text and handed to a
//! [`DecimalToBinary`] service together with the statement's rounding mode.
//! B, O and Z fields bypass decimal conversion: the scanned bit pattern is
//! stored directly into the item.

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

use entities_io_operations::{DataEdit, EditKind, FieldSource, IoFault};
use entities_utilities::{
    BinaryFloat, BinaryPrecision, ConversionFlags, ConversionToBinaryResult, DecimalToBinary,
};

use crate::scanner::{scan_integer, scan_real, ScannedReal};

/// Edit a REAL input field
///
/// # Arguments
/// * `io` - Character source of the statement
/// * `edit` - Edit descriptor: list-directed, F, E, EN, ES, D, G, B, O or Z
/// * `precision` - Binary format of the item
/// * `converter` - Decimal to binary conversion service
///
/// # Returns
/// The stored bits with the conversion flags. Digits beyond the format's
/// significant-digit limit are dropped and always raise INEXACT.
pub fn edit_real_input<S>(
    io: &mut S,
    edit: &DataEdit,
    precision: BinaryPrecision,
    converter: &dyn DecimalToBinary,
) -> Result<ConversionToBinaryResult, IoFault>
where
    S: FieldSource + ?Sized,
{
    if edit.descriptor.is_boz() {
        return edit_boz_real_input(io, edit, precision);
    }
    match edit.descriptor {
        EditKind::ListDirected
        | EditKind::F
        | EditKind::E
        | EditKind::EN
        | EditKind::ES
        | EditKind::D
        | EditKind::G => {}
        other => {
            return Err(IoFault::BadEditDescriptor {
                descriptor: format!("{other:?}"),
                item: "REAL",
            });
        }
    }

    let scanned = scan_real(io, edit, precision.max_decimal_conversion_digits())?;
    if scanned == ScannedReal::Empty {
        return Ok(ConversionToBinaryResult {
            binary: BinaryFloat::zero(precision, false),
            flags: ConversionFlags::EXACT,
        });
    }
    let text = scanned.to_decimal_text();
    let mut converted = converter.convert_to_binary(precision, &text, edit.modes.round);
    if matches!(scanned, ScannedReal::Finite { truncated: true, .. }) {
        converted.flags |= ConversionFlags::INEXACT;
    }
    tracing::trace!(%text, flags = converted.flags.bits(), "REAL field converted");
    Ok(converted)
}

/// Edit a REAL input field for an item of kind `kind`
///
/// An unsupported kind terminates the program.
pub fn edit_real_input_kind<S>(
    io: &mut S,
    edit: &DataEdit,
    kind: usize,
    converter: &dyn DecimalToBinary,
) -> Result<ConversionToBinaryResult, IoFault>
where
    S: FieldSource + ?Sized,
{
    let Some(precision) = BinaryPrecision::from_real_kind(kind) else {
        io.error_handler()
            .crash(format_args!("edit_real_input: bad REAL kind {kind}"));
    };
    edit_real_input(io, edit, precision, converter)
}

/// Reinterpret a B, O or Z field as the item's storage bits
fn edit_boz_real_input<S>(
    io: &mut S,
    edit: &DataEdit,
    precision: BinaryPrecision,
) -> Result<ConversionToBinaryResult, IoFault>
where
    S: FieldSource + ?Sized,
{
    let base = edit.descriptor.integer_base().unwrap_or(16);
    let scanned = scan_integer(io, edit, base)?;
    let raw = if scanned.negative {
        scanned.magnitude.negated()
    } else {
        scanned.magnitude.low_u128()
    };
    let bits = 8 * precision.storage_bytes() as u32;
    let pattern = if bits >= 128 {
        raw
    } else {
        raw & ((1u128 << bits) - 1)
    };
    Ok(ConversionToBinaryResult {
        binary: BinaryFloat::from_bits(precision, pattern),
        flags: ConversionFlags::EXACT,
    })
}
