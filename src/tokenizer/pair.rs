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

//! Extracting the text between start and end tokens

use super::scanner::ChunkedInput;
use super::FragmentResult;
use crate::error::ExpressionResult;
use memchr::memmem::Finder;

/// Streams the text enclosed by each start token and the next end token
///
/// Text outside a pair is skipped. A start token with no end token before the
/// end of input is dropped.
pub struct PairSplitter {
    input: ChunkedInput,
    start: Finder<'static>,
    end: Finder<'static>,
    include_tokens: bool,
    end_search_from: usize,
    done: bool,
}

impl PairSplitter {
    /// Split `input` on `start_token` ... `end_token` pairs
    pub fn new(input: ChunkedInput, start_token: &str, end_token: &str, include_tokens: bool) -> Self {
        Self {
            input,
            start: Finder::new(start_token.as_bytes()).into_owned(),
            end: Finder::new(end_token.as_bytes()).into_owned(),
            include_tokens,
            end_search_from: 0,
            done: false,
        }
    }

    fn next_fragment(&mut self) -> ExpressionResult<Option<Vec<u8>>> {
        let start_len = self.start.needle().len();
        let end_len = self.end.needle().len();
        loop {
            let pending = self.input.pending();
            let Some(start) = self.start.find(pending) else {
                if self.input.is_eof() {
                    return Ok(None);
                }
                // keep a possible partial start token
                let discard = pending.len().saturating_sub(start_len.saturating_sub(1));
                self.input.consume(discard);
                self.input.refill()?;
                continue;
            };
            if start > 0 {
                self.input.consume(start);
                continue;
            }

            let from = self.end_search_from.max(start_len);
            match self.end.find(&pending[from..]) {
                Some(offset) => {
                    let end = from + offset;
                    let fragment = if self.include_tokens {
                        self.input.take(end + end_len)
                    } else {
                        let inner = pending[start_len..end].to_vec();
                        self.input.consume(end + end_len);
                        inner
                    };
                    self.end_search_from = 0;
                    return Ok(Some(fragment));
                }
                None if self.input.is_eof() => {
                    log::debug!("Dropping unterminated pair at end of input");
                    return Ok(None);
                }
                None => {
                    self.end_search_from = pending.len().saturating_sub(end_len.saturating_sub(1));
                    self.input.refill()?;
                }
            }
        }
    }
}

impl Iterator for PairSplitter {
    type Item = FragmentResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_fragment();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
            self.input.release();
        }
        result.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn split(body: &str, include_tokens: bool, chunk: usize) -> Vec<String> {
        let input = ChunkedInput::new(Box::new(Cursor::new(body.as_bytes().to_vec())), chunk, None);
        PairSplitter::new(input, "<x>", "</x>", include_tokens)
            .map(|fragment| String::from_utf8(fragment.unwrap()).unwrap())
            .collect()
    }

    #[rstest]
    fn test_pairs_without_tokens(#[values(1, 2, 3, 64)] chunk: usize) {
        assert_eq!(split("<x>1</x><x>2</x>", false, chunk), vec!["1", "2"]);
    }

    #[rstest]
    fn test_pairs_with_tokens(#[values(1, 4, 64)] chunk: usize) {
        assert_eq!(
            split("<x>1</x><x>2</x>", true, chunk),
            vec!["<x>1</x>", "<x>2</x>"]
        );
    }

    #[rstest]
    #[case::noise_between("head<x>a</x>mid<x>b</x>tail", vec!["a", "b"])]
    #[case::unterminated("<x>a</x><x>b", vec!["a"])]
    #[case::no_pairs("nothing here", vec![])]
    #[case::empty_pair("<x></x>", vec![""])]
    #[case::empty("", vec![])]
    fn test_pair_edge_cases(#[case] body: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split(body, false, 2), expected);
    }
}
