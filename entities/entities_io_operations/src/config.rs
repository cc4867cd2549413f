//! Runtime Configuration
//!
//! Knobs for the unit directory and the predefined units, read once when the
//! directory is first touched.

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

/// Environment variable that marks the predefined units as UTF-8
pub const DEFAULT_UTF8_VAR: &str = "DEFAULT_UTF8";

/// Unit directory and predefined-unit settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Unit connected to standard output
    pub stdout_unit: i32,
    /// Unit connected to standard input
    pub stdin_unit: i32,
    /// Unit connected to standard error
    pub stderr_unit: i32,
    /// Number of directory hash buckets
    pub bucket_count: usize,
    /// First unit number handed out for NEWUNIT=; later ones decrease
    pub new_unit_base: i32,
    /// Initial window when scanning for the end of a formatted record
    pub read_chunk: usize,
    /// Predefined units use UTF-8 encoding
    pub default_utf8: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stdout_unit: 6,
            stdin_unit: 5,
            stderr_unit: 0,
            bucket_count: 64,
            new_unit_base: -1000,
            read_chunk: 256,
            default_utf8: false,
        }
    }
}

impl RuntimeConfig {
    /// Defaults adjusted by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults adjusted by an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(DEFAULT_UTF8_VAR) {
            config.default_utf8 = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "y" | "yes" | "true" | "on"
            );
        }
        config
    }
}
