//! Unit Map
//!
//! Fixed-bucket hash table from unit number to external unit. Units live
//! behind shared handles; CLOSE moves a unit from the live table to a
//! closing list so no new statement can find it, and the last handle is
//! dropped once it is unlinked from there. A number is never live and
//! closing at once: creating a unit whose number is still closing waits
//! for the close to finish.

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

use std::sync::Arc;

use entities_io_operations::{
    set_crash_hook, CloseStatus, HandlerFlags, Iostat, RuntimeConfig, Terminator,
};
use lazy_static::lazy_static;
use parking_lot::{Condvar, Mutex};
use usecases_io_operations::{ExternalFileUnit, StatementKind};

#[derive(Debug)]
struct Table {
    buckets: Vec<Vec<Arc<ExternalFileUnit>>>,
    closing: Vec<Arc<ExternalFileUnit>>,
    next_new_unit: i32,
}

impl Table {
    fn bucket(&self, n: i32) -> usize {
        (n as u32 as usize) % self.buckets.len()
    }

    fn find(&self, n: i32) -> Option<&Arc<ExternalFileUnit>> {
        self.buckets[self.bucket(n)]
            .iter()
            .find(|unit| unit.unit_number() == n)
    }

    fn is_closing(&self, n: i32) -> bool {
        self.closing.iter().any(|unit| unit.unit_number() == n)
    }
}

/// Directory of external units
#[derive(Debug)]
pub struct UnitMap {
    table: Mutex<Table>,
    closed: Condvar,
    read_chunk: usize,
}

impl UnitMap {
    /// Create an empty directory
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            table: Mutex::new(Table {
                buckets: vec![Vec::new(); config.bucket_count.max(1)],
                closing: Vec::new(),
                next_new_unit: config.new_unit_base,
            }),
            closed: Condvar::new(),
            read_chunk: config.read_chunk,
        }
    }

    /// Create a directory holding the predefined units
    ///
    /// The standard output unit gets fd 1, standard input fd 0 and standard
    /// error fd 2.
    pub fn with_predefined_units(config: &RuntimeConfig) -> Self {
        let map = Self::new(config);
        for (n, fd) in [
            (config.stdout_unit, 1),
            (config.stdin_unit, 0),
            (config.stderr_unit, 2),
        ] {
            let (unit, _) = map.look_up_or_create(n);
            unit.predefine(fd, config.default_utf8);
        }
        tracing::debug!(
            stdout = config.stdout_unit,
            stdin = config.stdin_unit,
            stderr = config.stderr_unit,
            "predefined units connected"
        );
        map
    }

    /// Find a live unit
    pub fn look_up(&self, n: i32) -> Option<Arc<ExternalFileUnit>> {
        self.table.lock().find(n).cloned()
    }

    /// Find a live unit, creating an unconnected one when absent
    ///
    /// While a unit with number `n` is being closed, waits until it is
    /// destroyed.
    ///
    /// # Returns
    /// The unit and whether it already existed
    pub fn look_up_or_create(&self, n: i32) -> (Arc<ExternalFileUnit>, bool) {
        let mut table = self.table.lock();
        loop {
            if let Some(unit) = table.find(n) {
                return (Arc::clone(unit), true);
            }
            if !table.is_closing(n) {
                break;
            }
            tracing::trace!(unit = n, "waiting for unit to finish closing");
            self.closed.wait(&mut table);
        }
        let unit = Arc::new(ExternalFileUnit::with_read_chunk(n, self.read_chunk));
        let bucket = table.bucket(n);
        table.buckets[bucket].push(Arc::clone(&unit));
        (unit, false)
    }

    /// Find a live unit; a missing one is fatal
    pub fn look_up_or_crash(&self, n: i32, terminator: &Terminator) -> Arc<ExternalFileUnit> {
        match self.look_up(n) {
            Some(unit) => unit,
            None => terminator.crash(format_args!("Not an open I/O unit number: {n}")),
        }
    }

    /// Move a unit from the live table to the closing list
    ///
    /// Later lookups of `n` no longer see it.
    pub fn look_up_for_close(&self, n: i32) -> Option<Arc<ExternalFileUnit>> {
        let mut table = self.table.lock();
        let bucket = table.bucket(n);
        let index = table.buckets[bucket]
            .iter()
            .position(|unit| unit.unit_number() == n)?;
        let unit = table.buckets[bucket].swap_remove(index);
        table.closing.push(Arc::clone(&unit));
        Some(unit)
    }

    /// Unlink a closed unit from the closing list
    ///
    /// The directory's handle is dropped after the lock is released.
    pub fn destroy_closed(&self, unit: &Arc<ExternalFileUnit>) {
        let removed = {
            let mut table = self.table.lock();
            table
                .closing
                .iter()
                .position(|closing| Arc::ptr_eq(closing, unit))
                .map(|index| table.closing.swap_remove(index))
        };
        if removed.is_some() {
            self.closed.notify_all();
            tracing::debug!(unit = unit.unit_number(), "unit destroyed");
        }
        drop(removed);
    }

    /// Close every live unit with STATUS='KEEP'
    ///
    /// Run once at shutdown, when no statement is active.
    pub fn close_all(&self) {
        let units: Vec<Arc<ExternalFileUnit>> = {
            let mut table = self.table.lock();
            table.buckets.iter_mut().flat_map(std::mem::take).collect()
        };
        for unit in units {
            let mut stmt = unit.begin_io_statement(StatementKind::Close, Terminator::new(None, 0));
            stmt.enable_handlers(HandlerFlags::IOSTAT);
            stmt.close_unit(CloseStatus::Keep);
            let stat = stmt.end_io_statement();
            if stat != Iostat::Ok {
                tracing::warn!(unit = unit.unit_number(), iostat = stat.code(), "unit did not close cleanly");
            }
        }
    }

    /// Next unit number for NEWUNIT=
    ///
    /// Numbers are negative and decrease from the configured base.
    pub fn new_unit(&self) -> i32 {
        let mut table = self.table.lock();
        let n = table.next_new_unit;
        table.next_new_unit -= 1;
        n
    }

    /// Number of live units
    pub fn len(&self) -> usize {
        self.table.lock().buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush unit `n` without waiting on any lock
    pub fn flush_on_crash(&self, n: i32) {
        let unit = self
            .table
            .try_lock()
            .and_then(|table| table.find(n).cloned());
        if let Some(unit) = unit {
            unit.flush_on_crash();
        }
    }
}

lazy_static! {
    static ref UNIT_MAP: UnitMap = {
        let config = RuntimeConfig::from_env();
        let map = UnitMap::with_predefined_units(&config);
        let stdout_unit = config.stdout_unit;
        set_crash_hook(move || UNIT_MAP.flush_on_crash(stdout_unit));
        map
    };
}

/// The process-wide unit directory, created with the predefined units on
/// first use
pub fn unit_map() -> &'static UnitMap {
    &UNIT_MAP
}
