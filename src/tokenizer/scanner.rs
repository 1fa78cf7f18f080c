// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Incremental buffering over a body reader

use crate::error::{ExpressionError, ExpressionResult};
use crate::model::BoxedReader;
use std::io::ErrorKind;

/// A growable window over a reader
///
/// Splitters search [`pending`](Self::pending), [`consume`](Self::consume)
/// what they hand out and [`refill`](Self::refill) when they need more. Only
/// the unconsumed tail is kept in memory. The reader is dropped as soon as it
/// reports end of input, fails, or the input is released.
pub struct ChunkedInput {
    reader: Option<BoxedReader>,
    buffer: Vec<u8>,
    start: usize,
    chunk_size: usize,
    max_pending: Option<usize>,
}

impl ChunkedInput {
    /// Read from `reader` `chunk_size` bytes at a time
    ///
    /// When `max_pending` is set, a refill that would grow the unconsumed
    /// window beyond it fails instead.
    pub fn new(reader: BoxedReader, chunk_size: usize, max_pending: Option<usize>) -> Self {
        Self {
            reader: Some(reader),
            buffer: Vec::with_capacity(chunk_size),
            start: 0,
            chunk_size: chunk_size.max(1),
            max_pending,
        }
    }

    /// Bytes read but not yet consumed
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.start..]
    }

    /// True once the reader has reported end of input
    pub fn is_eof(&self) -> bool {
        self.reader.is_none()
    }

    /// Read one more chunk; returns `false` at end of input
    pub fn refill(&mut self) -> ExpressionResult<bool> {
        if self.reader.is_none() {
            return Ok(false);
        }
        if let Some(max) = self.max_pending {
            if self.buffer.len() - self.start >= max {
                self.release();
                return Err(ExpressionError::evaluation(format!(
                    "fragment exceeds the maximum size of {max} bytes"
                )));
            }
        }

        if self.start > 0 && self.start >= self.buffer.len() / 2 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }

        let filled = self.buffer.len();
        self.buffer.resize(filled + self.chunk_size, 0);
        let Some(reader) = self.reader.as_mut() else {
            self.buffer.truncate(filled);
            return Ok(false);
        };
        loop {
            match reader.read(&mut self.buffer[filled..]) {
                Ok(0) => {
                    self.buffer.truncate(filled);
                    self.reader = None;
                    return Ok(false);
                }
                Ok(read) => {
                    self.buffer.truncate(filled + read);
                    log::trace!("Read {read} bytes, {} pending", self.buffer.len() - self.start);
                    return Ok(true);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buffer.truncate(filled);
                    self.release();
                    return Err(err.into());
                }
            }
        }
    }

    /// Mark the first `count` pending bytes as consumed
    pub fn consume(&mut self, count: usize) {
        self.start = (self.start + count).min(self.buffer.len());
    }

    /// Copy out and consume the first `count` pending bytes
    pub fn take(&mut self, count: usize) -> Vec<u8> {
        let taken = self.pending()[..count].to_vec();
        self.consume(count);
        taken
    }

    /// Copy out and consume everything pending
    pub fn take_all(&mut self) -> Vec<u8> {
        let count = self.pending().len();
        self.take(count)
    }

    /// Drop the reader and any buffered bytes
    pub fn release(&mut self) {
        self.reader = None;
        self.buffer = Vec::new();
        self.start = 0;
    }
}
