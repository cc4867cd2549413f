//! Open File
//!
//! The operating-system side of a unit's connection: a file, a scratch file,
//! or one of the standard streams, plus the capability flags that say which
//! operations the connection permits.

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

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use entities_io_operations::{CloseStatus, IoFault, OpenStatus, Position};
use thiserror::Error;

/// Failure to connect or disconnect a file
#[derive(Debug, Error)]
pub enum OpenError {
    /// The operating system refused the operation
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A named open was requested without a name
    #[error("OPEN without FILE= for a file that is not scratch")]
    MissingPath,
}

impl From<OpenError> for IoFault {
    fn from(error: OpenError) -> Self {
        match &error {
            OpenError::Io { source, .. } => match source.raw_os_error() {
                Some(code) => IoFault::Os {
                    code,
                    message: error.to_string(),
                },
                None => IoFault::Generic(error.to_string()),
            },
            OpenError::MissingPath => IoFault::BadKeyword(error.to_string()),
        }
    }
}

#[derive(Debug)]
enum Backing {
    File(File),
    Stdin,
    Stdout,
    Stderr,
}

/// Check whether a descriptor is connected to a terminal
#[cfg(unix)]
pub fn fd_is_terminal(fd: i32) -> bool {
    // SAFETY: isatty only inspects the descriptor
    unsafe { libc::isatty(fd) == 1 }
}

/// Check whether a descriptor is connected to a terminal
#[cfg(not(unix))]
pub fn fd_is_terminal(_fd: i32) -> bool {
    false
}

/// OS connection of a unit
#[derive(Debug, Default)]
pub struct OpenFile {
    path: Option<PathBuf>,
    backing: Option<Backing>,
    may_read: bool,
    may_write: bool,
    may_position: bool,
    is_terminal: bool,
    is_scratch: bool,
}

impl OpenFile {
    /// Create a disconnected file
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to standard input (0), output (1) or error (2)
    pub fn predefine(&mut self, fd: i32) {
        self.backing = Some(match fd {
            0 => Backing::Stdin,
            2 => Backing::Stderr,
            _ => Backing::Stdout,
        });
        self.path = None;
        self.may_read = fd == 0;
        self.may_write = fd != 0;
        self.may_position = false;
        self.is_terminal = fd_is_terminal(fd);
        self.is_scratch = false;
    }

    /// Connect to a file
    ///
    /// # Arguments
    /// * `status` - OPEN STATUS=
    /// * `position` - OPEN POSITION=
    /// * `path` - File name; ignored for scratch files
    ///
    /// # Returns
    /// The file offset the connection starts at
    pub fn open(
        &mut self,
        status: OpenStatus,
        position: Position,
        path: Option<&Path>,
    ) -> Result<u64, OpenError> {
        self.is_scratch = status == OpenStatus::Scratch;
        self.may_read = true;
        self.may_write = true;
        self.may_position = true;
        let file = if self.is_scratch {
            self.path = None;
            tempfile::tempfile().map_err(|source| OpenError::Io {
                path: PathBuf::from("scratch"),
                source,
            })?
        } else {
            let path = path.ok_or(OpenError::MissingPath)?;
            self.path = Some(path.to_path_buf());
            let mut options = OpenOptions::new();
            options.read(true).write(true);
            match status {
                OpenStatus::New => {
                    options.create_new(true);
                }
                OpenStatus::Replace => {
                    options.create(true).truncate(true);
                }
                OpenStatus::Unknown => {
                    options.create(true);
                }
                OpenStatus::Old | OpenStatus::Scratch => {}
            }
            match options.open(path) {
                Ok(file) => file,
                Err(error) if error.kind() == ErrorKind::PermissionDenied && status == OpenStatus::Old => {
                    self.may_write = false;
                    File::open(path).map_err(|source| OpenError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?
                }
                Err(source) => {
                    return Err(OpenError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        };
        self.is_terminal = is_terminal_file(&file);
        let start = match position {
            Position::Append => file.metadata().map(|m| m.len()).unwrap_or(0),
            Position::AsIs | Position::Rewind => 0,
        };
        tracing::debug!(path = ?self.path, ?status, start, "file connected");
        self.backing = Some(Backing::File(file));
        Ok(start)
    }

    /// Disconnect, deleting the file when asked (scratch files always go)
    pub fn close(&mut self, status: CloseStatus) -> Result<(), OpenError> {
        match self.backing.take() {
            Some(Backing::File(file)) => drop(file),
            Some(Backing::Stdout) => {
                let _ = io::stdout().flush();
            }
            Some(Backing::Stderr) => {
                let _ = io::stderr().flush();
            }
            Some(Backing::Stdin) | None => {}
        }
        if status == CloseStatus::Delete && !self.is_scratch {
            if let Some(path) = &self.path {
                std::fs::remove_file(path).map_err(|source| OpenError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        self.is_scratch = false;
        Ok(())
    }

    /// Check whether the unit is connected
    pub fn is_open(&self) -> bool {
        self.backing.is_some()
    }

    /// File name of a named connection
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn may_read(&self) -> bool {
        self.may_read
    }

    pub fn may_write(&self) -> bool {
        self.may_write
    }

    pub fn may_position(&self) -> bool {
        self.may_position
    }

    pub fn set_may_read(&mut self, yes: bool) {
        self.may_read = yes;
    }

    pub fn set_may_write(&mut self, yes: bool) {
        self.may_write = yes;
    }

    pub fn set_may_position(&mut self, yes: bool) {
        self.may_position = yes;
    }

    /// Connected to a terminal
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Read as many bytes as are available at `offset`, up to `buffer.len()`
    ///
    /// Standard input ignores `offset` and reads sequentially, returning at
    /// the first newline so an interactive READ does not wait for more lines.
    pub fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        match self.backing.as_mut() {
            Some(Backing::File(file)) => {
                file.seek(SeekFrom::Start(offset))?;
                read_fully(file, buffer)
            }
            Some(Backing::Stdin) => read_line(&mut io::stdin().lock(), buffer),
            Some(Backing::Stdout | Backing::Stderr) => Err(io::Error::new(
                ErrorKind::Unsupported,
                "read from an output stream",
            )),
            None => Err(not_connected()),
        }
    }

    /// Write `data` at `offset`
    ///
    /// The standard streams ignore `offset` and append.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        match self.backing.as_mut() {
            Some(Backing::File(file)) => {
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(data)
            }
            Some(Backing::Stdout) => io::stdout().lock().write_all(data),
            Some(Backing::Stderr) => io::stderr().lock().write_all(data),
            Some(Backing::Stdin) => Err(io::Error::new(
                ErrorKind::Unsupported,
                "write to an input stream",
            )),
            None => Err(not_connected()),
        }
    }

    /// Push written data to the operating system
    pub fn flush(&mut self) -> io::Result<()> {
        match self.backing.as_mut() {
            Some(Backing::File(file)) => file.flush(),
            Some(Backing::Stdout) => io::stdout().flush(),
            Some(Backing::Stderr) => io::stderr().flush(),
            Some(Backing::Stdin) | None => Ok(()),
        }
    }
}

fn read_fully<R: Read + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buffer.len() {
        match reader.read(&mut buffer[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(got)
}

/// Fill `buffer` up to and including the first newline
///
/// Fewer bytes than `buffer.len()` without a trailing newline means the
/// input ended.
fn read_line<R: BufRead + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buffer.len() {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            break;
        }
        let wanted = available.len().min(buffer.len() - got);
        let taken = match available[..wanted].iter().position(|&byte| byte == b'\n') {
            Some(newline) => newline + 1,
            None => wanted,
        };
        buffer[got..got + taken].copy_from_slice(&available[..taken]);
        reader.consume(taken);
        got += taken;
        if buffer[got - 1] == b'\n' {
            break;
        }
    }
    Ok(got)
}

fn not_connected() -> io::Error {
    io::Error::new(ErrorKind::NotConnected, "unit is not connected to a file")
}

#[cfg(unix)]
fn is_terminal_file(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    fd_is_terminal(file.as_raw_fd())
}

#[cfg(not(unix))]
fn is_terminal_file(_file: &File) -> bool {
    false
}
