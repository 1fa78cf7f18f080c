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

//! Lazy, single-pass sequences
//!
//! Every element is computed on demand from the source it was built from, so
//! a sequence over a large body never holds more than the element currently
//! being produced. A sequence cannot be restarted: once consumed, the source
//! expression has to be evaluated again against the original body.

use crate::error::ExpressionResult;
use crate::model::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// One produced element, or the error that stopped production
pub type SequenceItem = ExpressionResult<Value>;

type BoxedSource = Box<dyn Iterator<Item = SequenceItem> + Send>;

struct SequenceState {
    source: Option<BoxedSource>,
    peeked: Option<SequenceItem>,
    produced: usize,
}

impl SequenceState {
    fn next(&mut self) -> Option<SequenceItem> {
        let item = match self.peeked.take() {
            Some(item) => item,
            None => {
                let pulled = self.source.as_mut()?.next();
                let Some(item) = pulled else {
                    // Drops the underlying reader as soon as it is exhausted
                    self.source = None;
                    return None;
                };
                item
            }
        };
        Some(self.hand_out(item))
    }

    fn hand_out(&mut self, item: SequenceItem) -> SequenceItem {
        match item {
            Err(err) => {
                log::warn!(
                    "Sequence stopped after {} elements: {}",
                    self.produced,
                    err
                );
                self.source = None;
                Err(err)
            }
            Ok(value) => {
                self.produced += 1;
                Ok(value)
            }
        }
    }

    fn peek_available(&mut self) -> bool {
        if self.peeked.is_some() {
            return true;
        }
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        match source.next() {
            Some(item) => {
                self.peeked = Some(item);
                true
            }
            None => {
                self.source = None;
                false
            }
        }
    }
}

/// A forward-only sequence of produced values
///
/// Cloning shares the cursor. Dropping the last handle, or calling
/// [`LazySequence::close`], releases whatever the source holds open.
#[derive(Clone)]
pub struct LazySequence {
    state: Arc<Mutex<SequenceState>>,
}

impl LazySequence {
    /// Create a sequence over an iterator of results
    pub fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = SequenceItem> + Send + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(SequenceState {
                source: Some(Box::new(source)),
                peeked: None,
                produced: 0,
            })),
        }
    }

    /// Create a sequence over already materialized values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values.into_iter().map(Ok))
    }

    /// Create an empty sequence
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Check whether another element is available
    ///
    /// The element is computed and buffered, so it is not lost.
    pub fn has_next(&self) -> bool {
        self.state.lock().peek_available()
    }

    /// Number of elements handed out so far
    pub fn produced(&self) -> usize {
        self.state.lock().produced
    }

    /// Stop consuming and release the source
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.source = None;
        state.peeked = None;
    }

    /// Whether the source has been exhausted or closed
    pub fn is_closed(&self) -> bool {
        let state = self.state.lock();
        state.source.is_none() && state.peeked.is_none()
    }

    /// Wrap every element in a lazily applied transformation
    ///
    /// The transformation runs when the element is pulled, never ahead of it.
    pub fn map_values<F>(self, mut transform: F) -> Self
    where
        F: FnMut(Value) -> SequenceItem + Send + 'static,
    {
        Self::new(self.map(move |item| item.and_then(&mut transform)))
    }

    /// Drain the remaining elements, stopping at the first error
    pub fn try_collect(self) -> ExpressionResult<Vec<Value>> {
        self.collect()
    }

    /// Check if two handles share the same cursor
    pub fn ptr_eq(&self, other: &LazySequence) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Iterator for LazySequence {
    type Item = SequenceItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.lock().next()
    }
}

impl fmt::Debug for LazySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LazySequence")
            .field("produced", &state.produced)
            .field("closed", &(state.source.is_none() && state.peeked.is_none()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_single_pass() {
        let seq = LazySequence::from_values(vec![Value::from("a"), Value::from("b")]);
        let shared = seq.clone();
        assert_eq!(seq.try_collect().unwrap().len(), 2);
        assert!(shared.is_closed());
        assert_eq!(shared.try_collect().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_map_values_is_deferred() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut seq = LazySequence::from_values(vec![Value::from(1), Value::from(2)]).map_values(
            move |value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            },
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(seq.next().unwrap().unwrap(), Value::Integer(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_fuses_sequence() {
        let items = vec![
            Ok(Value::from("a")),
            Err(ExpressionError::evaluation("boom")),
            Ok(Value::from("b")),
        ];
        let mut seq = LazySequence::new(items.into_iter());
        assert!(seq.next().unwrap().is_ok());
        assert!(seq.next().unwrap().is_err());
        assert!(seq.next().is_none());
    }

    #[test]
    fn test_error_after_has_next_fuses_sequence() {
        let items = vec![
            Ok(Value::from("a")),
            Err(ExpressionError::evaluation("boom")),
            Ok(Value::from("b")),
        ];
        let mut seq = LazySequence::new(items.into_iter());
        assert!(seq.next().unwrap().is_ok());
        assert!(seq.has_next());
        assert!(seq.next().unwrap().is_err());
        assert_eq!(seq.produced(), 1);
        assert!(!seq.has_next());
        assert!(seq.next().is_none());
        assert!(seq.is_closed());
    }

    #[test]
    fn test_close_releases_source() {
        struct Guard(Arc<AtomicUsize>);
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let guard = Guard(Arc::clone(&dropped));
        let seq = LazySequence::new(std::iter::repeat_with(move || {
            let _ = &guard;
            Ok(Value::from("x"))
        }));
        let mut reader = seq.clone();
        assert!(reader.next().is_some());
        seq.close();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_has_next_buffers_element() {
        let mut seq = LazySequence::from_values(vec![Value::from("only")]);
        assert!(seq.has_next());
        assert_eq!(seq.produced(), 0);
        assert_eq!(seq.next().unwrap().unwrap(), Value::from("only"));
        assert!(!seq.has_next());
    }
}
