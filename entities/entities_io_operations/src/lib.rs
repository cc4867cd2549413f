//! Entities Layer: I/O Operations
//!
//! Plain data and status types shared by every data transfer component.
//!
//! ## Overview
//!
//! The `entities_io_operations` crate is the entities layer of the I/O
//! runtime. It owns no files and performs no conversions; it defines what
//! the converters, units and directory exchange.
//!
//! ## Modules
//!
//! - **[`data_edit`](data_edit/index.html)**: Edit descriptors and their modes
//! - **[`connection`](connection/index.html)**: OPEN/CLOSE specifiers and per-record cursor state
//! - **[`iostat`](iostat/index.html)**: IOSTAT= codes and canned messages
//! - **[`error_handler`](error_handler/index.html)**: Per-statement status keeper and fatal termination
//! - **[`field_source`](field_source/index.html)**: Character input seen by field editing
//! - **[`config`](config/index.html)**: Runtime configuration
//!
//! ## Usage
//!
//! ```rust
//! use entities_io_operations::{HandlerFlags, IoErrorHandler, Iostat, Terminator};
//!
//! let mut handler = IoErrorHandler::new(Terminator::new(Some("main.f90"), 10));
//! handler.enable_handlers(HandlerFlags::IOSTAT);
//! handler.signal_end();
//! assert_eq!(handler.io_stat(), Iostat::End);
//! ```
//!
//! ## See Also
//!
//! - [`entities_utilities`](../entities_utilities/index.html): Rounding modes and binary formats

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

pub mod config;
pub mod connection;
pub mod data_edit;
pub mod error_handler;
pub mod field_source;
pub mod iostat;

pub use config::RuntimeConfig;
pub use connection::{
    Access, CloseStatus, ConnectionForm, ConnectionState, Direction, OpenStatus, Position,
};
pub use data_edit::{DataEdit, EditKind, MutableModes};
pub use error_handler::{set_crash_hook, HandlerFlags, IoErrorHandler, IoFault, Terminator};
pub use field_source::{is_list_separator, FieldSource};
pub use iostat::Iostat;
