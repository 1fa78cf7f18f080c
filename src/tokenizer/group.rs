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

//! Decorators around a raw splitter: skip-first and grouping

use super::{BoxedSplitter, FragmentResult};

/// Drops the first fragment
///
/// An error in place of the first fragment is passed through, not dropped.
pub struct SkipFirst {
    inner: BoxedSplitter,
    skipped: bool,
}

impl SkipFirst {
    /// Wrap `inner`
    pub fn new(inner: BoxedSplitter) -> Self {
        Self {
            inner,
            skipped: false,
        }
    }
}

impl Iterator for SkipFirst {
    type Item = FragmentResult;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.skipped {
            self.skipped = true;
            if let Err(err) = self.inner.next()? {
                return Some(Err(err));
            }
        }
        self.inner.next()
    }
}

/// How the fragments of one group are combined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupJoin {
    /// Joined with a delimiter between fragments
    Delimiter(Vec<u8>),
    /// Concatenated inside a synthetic element with this name
    Enclose(Vec<u8>),
}

impl GroupJoin {
    fn join(&self, fragments: Vec<Vec<u8>>) -> Vec<u8> {
        match self {
            GroupJoin::Delimiter(delimiter) => fragments.join(delimiter.as_slice()),
            GroupJoin::Enclose(tag) => {
                let body: usize = fragments.iter().map(Vec::len).sum();
                let mut joined = Vec::with_capacity(body + 2 * tag.len() + 5);
                joined.push(b'<');
                joined.extend_from_slice(tag);
                joined.push(b'>');
                for fragment in fragments {
                    joined.extend_from_slice(&fragment);
                }
                joined.extend_from_slice(b"</");
                joined.extend_from_slice(tag);
                joined.push(b'>');
                joined
            }
        }
    }
}

/// Combines every `size` consecutive fragments into one
///
/// The final group may be smaller. When grouping is active this decorator is
/// the only place the first fragment is skipped.
pub struct GroupIterator {
    inner: BoxedSplitter,
    size: usize,
    join: GroupJoin,
    skip_first: bool,
}

impl GroupIterator {
    /// Group `inner` by `size`, dropping its first fragment when `skip_first`
    pub fn new(inner: BoxedSplitter, size: usize, join: GroupJoin, skip_first: bool) -> Self {
        Self {
            inner,
            size: size.max(1),
            join,
            skip_first,
        }
    }
}

impl Iterator for GroupIterator {
    type Item = FragmentResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.skip_first {
            self.skip_first = false;
            if let Err(err) = self.inner.next()? {
                return Some(Err(err));
            }
        }

        let mut fragments = Vec::with_capacity(self.size);
        while fragments.len() < self.size {
            match self.inner.next() {
                Some(Ok(fragment)) => fragments.push(fragment),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if fragments.is_empty() {
            return None;
        }
        log::trace!("Emitting group of {} fragments", fragments.len());
        Some(Ok(self.join.join(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionError;
    use pretty_assertions::assert_eq;

    fn source(items: &[&str]) -> BoxedSplitter {
        let items: Vec<FragmentResult> = items.iter().map(|item| Ok(item.as_bytes().to_vec())).collect();
        Box::new(items.into_iter())
    }

    fn strings(iter: impl Iterator<Item = FragmentResult>) -> Vec<String> {
        iter.map(|item| String::from_utf8(item.unwrap()).unwrap()).collect()
    }

    #[test]
    fn test_skip_first() {
        assert_eq!(strings(SkipFirst::new(source(&["h", "a", "b"]))), vec!["a", "b"]);
        assert!(strings(SkipFirst::new(source(&[]))).is_empty());
    }

    #[test]
    fn test_skip_first_keeps_error() {
        let items: Vec<FragmentResult> = vec![Err(ExpressionError::evaluation("boom")), Ok(b"a".to_vec())];
        let mut skip = SkipFirst::new(Box::new(items.into_iter()));
        assert!(skip.next().unwrap().is_err());
    }

    #[test]
    fn test_group_keeps_partial_group() {
        let grouped = GroupIterator::new(
            source(&["a", "b", "c", "d", "e"]),
            2,
            GroupJoin::Delimiter(b",".to_vec()),
            false,
        );
        assert_eq!(strings(grouped), vec!["a,b", "c,d", "e"]);
    }

    #[test]
    fn test_group_skips_once() {
        let grouped = GroupIterator::new(
            source(&["h", "a", "b", "c"]),
            2,
            GroupJoin::Delimiter(b",".to_vec()),
            true,
        );
        assert_eq!(strings(grouped), vec!["a,b", "c"]);
    }

    #[test]
    fn test_group_enclose() {
        let grouped = GroupIterator::new(
            source(&["<i>1</i>", "<i>2</i>", "<i>3</i>"]),
            2,
            GroupJoin::Enclose(b"group".to_vec()),
            false,
        );
        assert_eq!(
            strings(grouped),
            vec!["<group><i>1</i><i>2</i></group>", "<group><i>3</i></group>"]
        );
    }
}
