//! Use Cases Layer: I/O Operations
//!
//! Provides the units I/O statements run against:
//! - External file units with record framing and positioning
//! - Internal units over character buffers
//! - The state of the statement running on a unit
//!
//! Depends on the Entities and Adapters layers.

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

pub mod internal_unit;
pub mod statement;
pub mod unit;

pub use internal_unit::InternalUnit;
pub use statement::{StatementKind, StatementState};
pub use unit::{ExternalFileUnit, IoStatement, UnitState, DEFAULT_READ_CHUNK, RECORD_MARKER_BYTES};
