//! Statement State
//!
//! The I/O statement currently running on a unit. A unit holds at most one,
//! built when the statement begins and dropped when it ends; the unit's
//! operations consult it to decide direction, framing and modes.

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

use entities_io_operations::{Direction, MutableModes};

/// Kind of statement to begin on a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Open,
    Close,
    /// READ/WRITE with an explicit format
    ExternalFormatted(Direction),
    /// READ/WRITE with `*` format
    ExternalList(Direction),
    /// READ/WRITE without a format
    Unformatted(Direction),
}

/// Active statement of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementState {
    #[default]
    Idle,
    Open,
    Close,
    ExternalFormatted {
        direction: Direction,
        modes: MutableModes,
    },
    ExternalList {
        direction: Direction,
        modes: MutableModes,
    },
    Unformatted {
        direction: Direction,
    },
}

impl StatementState {
    /// Build the state for a new statement
    ///
    /// Formatted statements start from the connection's default modes.
    pub fn begin(kind: StatementKind, connection_modes: MutableModes) -> Self {
        match kind {
            StatementKind::Open => StatementState::Open,
            StatementKind::Close => StatementState::Close,
            StatementKind::ExternalFormatted(direction) => StatementState::ExternalFormatted {
                direction,
                modes: connection_modes,
            },
            StatementKind::ExternalList(direction) => StatementState::ExternalList {
                direction,
                modes: connection_modes,
            },
            StatementKind::Unformatted(direction) => StatementState::Unformatted { direction },
        }
    }

    /// Transfer direction of a data transfer statement
    pub fn direction(&self) -> Option<Direction> {
        match self {
            StatementState::ExternalFormatted { direction, .. }
            | StatementState::ExternalList { direction, .. }
            | StatementState::Unformatted { direction } => Some(*direction),
            StatementState::Idle | StatementState::Open | StatementState::Close => None,
        }
    }

    /// Check whether the statement reads
    pub fn is_input(&self) -> bool {
        self.direction() == Some(Direction::Input)
    }

    /// Check whether the statement writes
    pub fn is_output(&self) -> bool {
        self.direction() == Some(Direction::Output)
    }

    /// Check whether the statement transfers data
    pub fn is_data_transfer(&self) -> bool {
        self.direction().is_some()
    }

    /// Check whether the statement is list-directed
    pub fn is_list_directed(&self) -> bool {
        matches!(self, StatementState::ExternalList { .. })
    }

    /// Modes of a formatted statement
    pub fn modes(&self) -> Option<&MutableModes> {
        match self {
            StatementState::ExternalFormatted { modes, .. } | StatementState::ExternalList { modes, .. } => {
                Some(modes)
            }
            _ => None,
        }
    }

    /// Mutable modes of a formatted statement
    pub fn modes_mut(&mut self) -> Option<&mut MutableModes> {
        match self {
            StatementState::ExternalFormatted { modes, .. } | StatementState::ExternalList { modes, .. } => {
                Some(modes)
            }
            _ => None,
        }
    }

    /// Statement name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            StatementState::Idle => "no statement",
            StatementState::Open => "OPEN",
            StatementState::Close => "CLOSE",
            StatementState::ExternalFormatted { direction: Direction::Input, .. }
            | StatementState::ExternalList { direction: Direction::Input, .. }
            | StatementState::Unformatted { direction: Direction::Input } => "READ",
            _ => "WRITE",
        }
    }
}
