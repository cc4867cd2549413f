//! API Facades Layer
//!
//! Provides the statement-level entry points of the I/O runtime: begin a
//! statement on a unit number, transfer items, end the statement and read
//! back its IOSTAT= value.
//!
//! All facades call underlying Rust modules from inner layers.

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

pub mod io_api;

pub use io_api::{io_shutdown, IoApi, OpenSpecifiers, Statement};
