//! Infrastructure Layer: Unit Map
//!
//! Provides the process-wide unit directory:
//! - Lookup and creation of external units by number
//! - Two-phase removal for CLOSE
//! - NEWUNIT= numbers and shutdown
//!
//! Depends on the Entities and Use Cases layers.

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

pub mod unit_map;

pub use unit_map::{unit_map, UnitMap};
