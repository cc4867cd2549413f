//! Use Cases Layer: Numeric Input
//!
//! Edits INTEGER and REAL input fields read through any
//! [`FieldSource`](entities_io_operations::FieldSource).
//!
//! ## Modules
//!
//! - **[`scanner`](scanner/index.html)**: Field prefix, digit and exponent recognition
//! - **[`integer_input`](integer_input/index.html)**: INTEGER editing with kind truncation
//! - **[`real_input`](real_input/index.html)**: REAL editing through a decimal conversion service
//!
//! ## See Also
//!
//! - [`entities_utilities`](../entities_utilities/index.html): Accumulator and decimal conversion
//! - [`usecases_io_operations`](../usecases_io_operations/index.html): Units the fields are read from

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

pub mod integer_input;
pub mod real_input;
pub mod scanner;

pub use integer_input::{edit_integer_input, integer_to_ne_bytes, INTEGER_KINDS};
pub use real_input::{edit_real_input, edit_real_input_kind};
pub use scanner::{digit_value, scan_integer, scan_numeric_prefix, scan_real, NumericPrefix, ScannedInteger, ScannedReal};
