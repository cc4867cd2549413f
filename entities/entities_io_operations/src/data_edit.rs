//! Data Edit Descriptors
//!
//! The per-field editing instructions a format interpreter hands to the data
//! transfer routines. A `DataEdit` is immutable once built; the converters
//! only read it.

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

use entities_utilities::RoundingMode;

/// Kind of data edit descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// List-directed (no descriptor, free-form field)
    ListDirected,
    /// Iw.m integer
    I,
    /// Bw.m binary
    B,
    /// Ow.m octal
    O,
    /// Zw.m hexadecimal
    Z,
    /// Fw.d fixed point
    F,
    /// Ew.d exponent form
    E,
    /// Dw.d exponent form
    D,
    /// Gw.d generalized
    G,
    /// Aw character
    A,
    /// Lw logical
    L,
    /// ENw.d engineering
    EN,
    /// ESw.d scientific
    ES,
}

impl EditKind {
    /// Radix of an integer-style field, `None` for kinds that cannot edit integers
    pub fn integer_base(self) -> Option<u32> {
        match self {
            EditKind::ListDirected | EditKind::I | EditKind::G => Some(10),
            EditKind::B => Some(2),
            EditKind::O => Some(8),
            EditKind::Z => Some(16),
            _ => None,
        }
    }

    /// Check whether this is one of the B, O or Z bit-pattern descriptors
    pub fn is_boz(self) -> bool {
        matches!(self, EditKind::B | EditKind::O | EditKind::Z)
    }
}

/// Changeable modes in effect for a field
///
/// Defaults are the connection defaults: RN rounding, scale factor zero,
/// blanks ignored, decimal point, PAD='YES'.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutableModes {
    /// Rounding mode for REAL conversion
    pub round: RoundingMode,
    /// kP scale factor
    pub scale: i32,
    /// BZ: interior blanks are zeros
    pub blank_zero: bool,
    /// DECIMAL='COMMA'
    pub decimal_comma: bool,
    /// PAD='YES'
    pub pad: bool,
}

impl Default for MutableModes {
    fn default() -> Self {
        Self {
            round: RoundingMode::TiesToEven,
            scale: 0,
            blank_zero: false,
            decimal_comma: false,
            pad: true,
        }
    }
}

/// One data edit descriptor with its modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEdit {
    /// Descriptor kind
    pub descriptor: EditKind,
    /// Field width `w`; `None` for list-directed input
    pub width: Option<usize>,
    /// Digit count `d` (or minimum digits `m`)
    pub digits: Option<usize>,
    /// Modes in effect
    pub modes: MutableModes,
}

impl DataEdit {
    /// Create an edit with default modes
    ///
    /// # Arguments
    /// * `descriptor` - Descriptor kind
    /// * `width` - Field width, if any
    /// * `digits` - Digit count, if any
    pub fn new(descriptor: EditKind, width: Option<usize>, digits: Option<usize>) -> Self {
        Self {
            descriptor,
            width,
            digits,
            modes: MutableModes::default(),
        }
    }

    /// List-directed edit with default modes
    pub fn list_directed() -> Self {
        Self::new(EditKind::ListDirected, None, None)
    }

    /// Replace the modes
    pub fn with_modes(mut self, modes: MutableModes) -> Self {
        self.modes = modes;
        self
    }

    /// Check whether the field is list-directed
    pub fn is_list_directed(&self) -> bool {
        self.descriptor == EditKind::ListDirected
    }
}

impl Default for DataEdit {
    fn default() -> Self {
        Self::list_directed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boz_kinds() {
        assert!(EditKind::Z.is_boz());
        assert!(EditKind::B.is_boz());
        assert!(!EditKind::I.is_boz());
        assert!(!EditKind::ListDirected.is_boz());
    }

    #[test]
    fn test_integer_base() {
        assert_eq!(EditKind::I.integer_base(), Some(10));
        assert_eq!(EditKind::B.integer_base(), Some(2));
        assert_eq!(EditKind::O.integer_base(), Some(8));
        assert_eq!(EditKind::Z.integer_base(), Some(16));
        assert_eq!(EditKind::F.integer_base(), None);
    }

    #[test]
    fn test_default_modes() {
        let edit = DataEdit::list_directed();
        assert!(edit.is_list_directed());
        assert!(edit.modes.pad);
        assert!(!edit.modes.blank_zero);
        assert_eq!(edit.modes.round, RoundingMode::TiesToEven);
    }
}
