//! File Frame
//!
//! A window of file bytes held in memory around the current record. Reads
//! extend the window from the file on demand; writes land in the window and
//! are written back as one contiguous dirty range when the window moves, or
//! on flush.

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

use std::io;

use crate::open_file::OpenFile;

/// Written bytes held behind the write position before they are flushed
pub const FRAME_FLUSH_BYTES: usize = 64 * 1024;

/// Buffered window over a file
#[derive(Debug, Default)]
pub struct FileFrame {
    file_offset: u64,
    buffer: Vec<u8>,
    dirty: Option<(usize, usize)>,
}

impl FileFrame {
    /// Create an empty frame at offset zero
    pub fn new() -> Self {
        Self::default()
    }

    /// File offset of the first buffered byte
    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check whether written bytes await a flush
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Make up to `bytes` bytes starting at file offset `at` available
    ///
    /// # Returns
    /// How many of them exist; fewer than `bytes` means the file ended.
    pub fn read_frame(&mut self, file: &mut OpenFile, at: u64, bytes: usize) -> io::Result<usize> {
        self.reframe(file, at)?;
        let start = (at - self.file_offset) as usize;
        let wanted = start + bytes;
        if self.buffer.len() < wanted && file.may_read() {
            let old = self.buffer.len();
            self.buffer.resize(wanted, 0);
            let got = match file.read_at(self.file_offset + old as u64, &mut self.buffer[old..]) {
                Ok(got) => got,
                Err(error) => {
                    self.buffer.truncate(old);
                    return Err(error);
                }
            };
            self.buffer.truncate(old + got);
        }
        Ok(self.buffer.len().saturating_sub(start).min(bytes))
    }

    /// Buffered bytes from file offset `at`, at most `len` of them
    ///
    /// Empty when `at` lies outside the frame.
    pub fn bytes_at(&self, at: u64, len: usize) -> &[u8] {
        if at < self.file_offset {
            return &[];
        }
        let start = (at - self.file_offset) as usize;
        if start >= self.buffer.len() {
            return &[];
        }
        let end = (start + len).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// Store `data` at file offset `at`
    ///
    /// Existing file content around the written bytes is kept.
    pub fn write_frame(&mut self, file: &mut OpenFile, at: u64, data: &[u8]) -> io::Result<()> {
        self.reframe(file, at)?;
        let start = (at - self.file_offset) as usize;
        let end = start + data.len();
        if self.buffer.len() < end {
            if file.may_read() && file.may_position() {
                self.read_frame(file, at, data.len())?;
            }
            if self.buffer.len() < end {
                self.buffer.resize(end, 0);
            }
        }
        self.buffer[start..end].copy_from_slice(data);
        self.dirty = Some(match self.dirty {
            Some((low, high)) => (low.min(start), high.max(end)),
            None => (start, end),
        });
        Ok(())
    }

    /// Store `len` copies of `byte` at file offset `at`
    pub fn fill(&mut self, file: &mut OpenFile, at: u64, len: usize, byte: u8) -> io::Result<()> {
        self.write_frame(file, at, &vec![byte; len])
    }

    /// Write the dirty range back to the file
    pub fn flush(&mut self, file: &mut OpenFile) -> io::Result<()> {
        if let Some((low, high)) = self.dirty.take() {
            if let Err(error) = file.write_at(self.file_offset + low as u64, &self.buffer[low..high]) {
                self.dirty = Some((low, high));
                return Err(error);
            }
            tracing::trace!(offset = self.file_offset + low as u64, bytes = high - low, "frame flushed");
        }
        Ok(())
    }

    /// Discard everything buffered, written or not
    pub fn reset(&mut self, at: u64) {
        self.buffer.clear();
        self.dirty = None;
        self.file_offset = at;
    }

    /// Slide the frame so that it starts at or before `at`
    ///
    /// Bytes before `at` are dropped once they are clean; written bytes are
    /// kept for rewriting until more than [`FRAME_FLUSH_BYTES`] lie before
    /// `at`, then flushed.
    fn reframe(&mut self, file: &mut OpenFile, at: u64) -> io::Result<()> {
        let end = self.file_offset + self.buffer.len() as u64;
        if at < self.file_offset || at > end {
            self.flush(file)?;
            self.reset(at);
        } else if at > self.file_offset {
            let consumed = (at - self.file_offset) as usize;
            if self.dirty.is_some() {
                if consumed < FRAME_FLUSH_BYTES {
                    return Ok(());
                }
                self.flush(file)?;
            }
            self.buffer.drain(..consumed);
            self.file_offset = at;
        }
        Ok(())
    }
}
