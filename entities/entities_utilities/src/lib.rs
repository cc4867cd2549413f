//! Entities Layer: Utilities
//!
//! Provides the numeric building blocks used by data transfer:
//! - Wide unsigned accumulation of digit strings
//! - Binary floating-point storage formats
//! - Decimal to binary conversion with explicit rounding modes
//!
//! ## See Also
//!
//! - [`usecases_numeric_input`](../../usecases/usecases_numeric_input/index.html): field scanning
//!   and conversion built on these types

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

pub mod binary_float;
pub mod decimal;
pub mod wide;

pub use binary_float::{BinaryFloat, BinaryPrecision};
pub use decimal::{
    ConversionFlags, ConversionToBinaryResult, DecimalConverter, DecimalError, DecimalToBinary,
    RoundingMode,
};
pub use wide::WideUnsigned;
