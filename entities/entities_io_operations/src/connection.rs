//! Connection State
//!
//! Attributes of a unit's connection that every data transfer statement
//! consults: access method, record framing and the cursor within the current
//! record. Shared by external and internal units.

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

use crate::data_edit::MutableModes;

/// ACCESS= specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    #[default]
    Sequential,
    Direct,
    Stream,
}

/// STATUS= specifier of OPEN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenStatus {
    /// File must exist
    Old,
    /// File must not exist
    New,
    /// Anonymous file deleted on close
    Scratch,
    /// Create, truncating any existing file
    Replace,
    /// Open if present, create otherwise
    #[default]
    Unknown,
}

/// POSITION= specifier of OPEN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    #[default]
    AsIs,
    Rewind,
    Append,
}

/// STATUS= specifier of CLOSE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CloseStatus {
    #[default]
    Keep,
    Delete,
}

/// Transfer direction of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// ACCESS=, FORM= and RECL= requested by an OPEN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionForm {
    pub access: Access,
    /// FORM='FORMATTED'
    pub is_formatted: bool,
    /// RECL=; a fixed record length when present
    pub record_length: Option<usize>,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self {
            access: Access::Sequential,
            is_formatted: true,
            record_length: None,
        }
    }
}

/// Per-connection record state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    /// Access method
    pub access: Access,
    /// FORM='FORMATTED'
    pub is_formatted: bool,
    /// Declared fixed record length (RECL=)
    pub is_fixed_record_length: bool,
    /// Record length: declared, or discovered for sequential input
    pub record_length: Option<usize>,
    /// 1-based number of the current record
    pub current_record_number: u64,
    /// Record number of the end-file record, once known
    pub end_file_record_number: Option<u64>,
    /// Cursor within the current record
    pub position_in_record: usize,
    /// High-water mark of the current record
    pub furthest_position_in_record: usize,
    /// Floor for T/TL positioning after non-advancing output
    pub left_tab_limit: Option<usize>,
    /// ADVANCE='NO' in effect
    pub non_advancing: bool,
    /// ENCODING='UTF-8'
    pub is_utf8: bool,
    /// Connection default modes
    pub modes: MutableModes,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            access: Access::Sequential,
            is_formatted: true,
            is_fixed_record_length: false,
            record_length: None,
            current_record_number: 1,
            end_file_record_number: None,
            position_in_record: 0,
            furthest_position_in_record: 0,
            left_tab_limit: None,
            non_advancing: false,
            is_utf8: false,
            modes: MutableModes::default(),
        }
    }
}

impl ConnectionState {
    /// Take on the form of a new connection
    pub fn apply_form(&mut self, form: ConnectionForm) {
        self.access = form.access;
        self.is_formatted = form.is_formatted;
        self.is_fixed_record_length = form.record_length.is_some();
        self.record_length = form.record_length;
    }

    /// Reset the cursor for a new record
    pub fn begin_record(&mut self) {
        self.position_in_record = 0;
        self.furthest_position_in_record = 0;
        self.left_tab_limit = None;
    }

    /// Check whether the current record is the end-file record
    pub fn is_at_eof(&self) -> bool {
        self.end_file_record_number
            .is_some_and(|end| self.current_record_number >= end)
    }

    /// Bytes left in a record of known length, `None` when unbounded
    pub fn remaining_in_record(&self) -> Option<usize> {
        self.record_length
            .map(|length| length.saturating_sub(self.position_in_record))
    }

    /// Floor applied to absolute and relative tab positioning
    pub fn tab_floor(&self) -> usize {
        self.left_tab_limit.unwrap_or(0)
    }
}
