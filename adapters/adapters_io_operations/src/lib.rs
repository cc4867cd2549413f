//! Adapters Layer: I/O Operations
//!
//! Provides the operating-system side of external units:
//! - File connection, scratch files and the standard streams
//! - A buffered frame of file bytes around the current record
//!
//! Depends on the Entities layer.

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

pub mod file_frame;
pub mod open_file;

pub use file_frame::FileFrame;
pub use open_file::{fd_is_terminal, OpenError, OpenFile};
