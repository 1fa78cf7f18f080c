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

//! Single-use body readers

use parking_lot::Mutex;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// An owned, sendable reader
pub type BoxedReader = Box<dyn Read + Send>;

/// A body that is still sitting behind a reader
///
/// The reader can be taken exactly once; clones share the same slot, so
/// whoever takes it first owns the data and later takers see it consumed.
#[derive(Clone)]
pub struct BodyStream {
    reader: Arc<Mutex<Option<BoxedReader>>>,
}

impl BodyStream {
    /// Wrap a reader
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(Some(Box::new(reader)))),
        }
    }

    /// Take ownership of the reader, leaving the stream consumed
    pub fn take(&self) -> Option<BoxedReader> {
        self.reader.lock().take()
    }

    /// Whether the reader has already been taken
    pub fn is_consumed(&self) -> bool {
        self.reader.lock().is_none()
    }

    /// Check if two handles share the same reader slot
    pub fn ptr_eq(&self, other: &BodyStream) -> bool {
        Arc::ptr_eq(&self.reader, &other.reader)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_take_once() {
        let stream = BodyStream::new(Cursor::new(b"abc".to_vec()));
        let shared = stream.clone();
        assert!(!shared.is_consumed());

        let mut reader = stream.take().unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "abc");

        assert!(shared.is_consumed());
        assert!(shared.take().is_none());
        assert!(shared.ptr_eq(&stream));
    }
}
