//! INTEGER Input Editing
//!
//! Converts one input field into an INTEGER item of kind 1, 2, 4, 8 or 16.
//!
//! The digits accumulate into a 128-bit wrapping magnitude, the sign is
//! applied in two's complement, and the low `8 * kind` bits are stored. Out
//! of range input therefore wraps rather than faulting.

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

use entities_io_operations::{DataEdit, FieldSource, IoFault};

use crate::scanner::scan_integer;

/// INTEGER kinds with a storage representation
pub const INTEGER_KINDS: [usize; 5] = [1, 2, 4, 8, 16];

/// Edit an INTEGER input field
///
/// # Arguments
/// * `io` - Character source of the statement
/// * `edit` - Edit descriptor: list-directed, I, G, B, O or Z
/// * `kind` - Byte size of the INTEGER item
///
/// # Returns
/// The stored value sign-extended to `i128`, or a fault for an incompatible
/// descriptor or a bad digit. An unsupported `kind` terminates the program.
pub fn edit_integer_input<S>(io: &mut S, edit: &DataEdit, kind: usize) -> Result<i128, IoFault>
where
    S: FieldSource + ?Sized,
{
    if !INTEGER_KINDS.contains(&kind) {
        io.error_handler()
            .crash(format_args!("edit_integer_input: bad INTEGER kind {kind}"));
    }
    let base = edit
        .descriptor
        .integer_base()
        .ok_or_else(|| IoFault::BadEditDescriptor {
            descriptor: format!("{:?}", edit.descriptor),
            item: "INTEGER",
        })?;
    let scanned = scan_integer(io, edit, base)?;
    scanned
        .magnitude
        .to_integer_kind(scanned.negative, kind)
        .ok_or_else(|| IoFault::Generic(format!("bad INTEGER kind {kind}")))
}

/// Store an edited INTEGER value as `kind` native-order bytes
pub fn integer_to_ne_bytes(value: i128, kind: usize) -> Vec<u8> {
    let bytes = value.to_ne_bytes();
    if cfg!(target_endian = "little") {
        bytes[..kind].to_vec()
    } else {
        bytes[16 - kind..].to_vec()
    }
}
