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

//! Splitting on a literal delimiter or on regular expression matches

use super::scanner::ChunkedInput;
use super::FragmentResult;
use crate::error::{ExpressionError, ExpressionResult};
use memchr::memmem::Finder;
use regex::bytes::Regex;
use regex_automata::dfa::{dense, Automaton};
use regex_automata::util::syntax;
use regex_automata::Input;

/// Finds delimiter occurrences in a byte window
#[derive(Debug, Clone)]
pub enum Matcher {
    /// A literal byte string
    Literal(Finder<'static>),
    /// A regular expression
    Regex(RegexMatcher),
}

/// A compiled pattern plus the automaton that tells when a window is settled
///
/// `regex` finds the leftmost match inside the window. The DFA runs the same
/// leftmost-first search and goes dead once no further input could change
/// that match, so a window that ends before the DFA dies needs more input.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    settle: Option<dense::DFA<Vec<u32>>>,
}

impl RegexMatcher {
    /// Whether the leftmost match starting at or after `from` is final
    ///
    /// Without an automaton every window stays open until end of input.
    fn is_settled(&self, haystack: &[u8], from: usize) -> bool {
        let Some(dfa) = &self.settle else {
            return false;
        };
        let input = Input::new(haystack).range(from..);
        let Ok(mut state) = dfa.start_state_forward(&input) else {
            return false;
        };
        for &byte in &haystack[from..] {
            state = dfa.next_state(state, byte);
            if dfa.is_dead_state(state) {
                return true;
            }
            if dfa.is_quit_state(state) {
                return false;
            }
        }
        // matches are reported one byte late, so a window may end on a state
        // that can only die
        (0..=u8::MAX).all(|byte| dfa.is_dead_state(dfa.next_state(state, byte)))
    }
}

impl Matcher {
    /// Match `token` literally
    pub fn literal(token: &str) -> Self {
        Matcher::Literal(Finder::new(token.as_bytes()).into_owned())
    }

    /// Compile `pattern`
    ///
    /// Patterns that can match the empty string are rejected since they would
    /// never advance through the body.
    pub fn regex(pattern: &str) -> ExpressionResult<Self> {
        let regex = Regex::new(pattern).map_err(|err| {
            ExpressionError::configuration(format!("invalid regex '{pattern}': {err}"))
        })?;
        if regex.is_match(b"") {
            return Err(ExpressionError::configuration(format!(
                "regex '{pattern}' matches the empty string"
            )));
        }
        let settle = dense::Builder::new()
            .syntax(syntax::Config::new().utf8(false))
            .configure(dense::DFA::config().unicode_word_boundary(true))
            .build(pattern)
            .map_err(|err| {
                log::debug!("No streaming automaton for regex '{pattern}', buffering body: {err}");
                err
            })
            .ok();
        Ok(Matcher::Regex(RegexMatcher { regex, settle }))
    }

    /// Find the first match at or after `from` as a `(start, end)` range
    pub fn find(&self, haystack: &[u8], from: usize) -> Option<(usize, usize)> {
        match self {
            Matcher::Literal(finder) => {
                let start = from + finder.find(&haystack[from..])?;
                Some((start, start + finder.needle().len()))
            }
            Matcher::Regex(matcher) => matcher
                .regex
                .find_at(haystack, from)
                .map(|found| (found.start(), found.end())),
        }
    }

    /// Where to resume searching after a miss in a window of `len` bytes
    fn resume_from(&self, len: usize) -> usize {
        match self {
            Matcher::Literal(finder) => len.saturating_sub(finder.needle().len().saturating_sub(1)),
            Matcher::Regex(_) => 0,
        }
    }
}

/// Streams the text between delimiter occurrences
///
/// Empty fragments between adjacent delimiters are produced. Text after the
/// last delimiter is produced when non-empty, so a body ending with the
/// delimiter yields no trailing empty fragment.
pub struct DelimiterSplitter {
    input: ChunkedInput,
    matcher: Matcher,
    search_from: usize,
    done: bool,
}

impl DelimiterSplitter {
    /// Split `input` on `matcher`
    pub fn new(input: ChunkedInput, matcher: Matcher) -> Self {
        Self {
            input,
            matcher,
            search_from: 0,
            done: false,
        }
    }

    fn is_settled(&self, pending: &[u8]) -> bool {
        match &self.matcher {
            Matcher::Literal(_) => true,
            Matcher::Regex(matcher) => matcher.is_settled(pending, self.search_from),
        }
    }

    fn next_fragment(&mut self) -> ExpressionResult<Option<Vec<u8>>> {
        loop {
            let pending = self.input.pending();
            let found = self.matcher.find(pending, self.search_from);
            match found {
                Some(_) if !self.input.is_eof() && !self.is_settled(pending) => {
                    // a longer or earlier match may need the next chunk
                    self.input.refill()?;
                }
                Some((start, end)) => {
                    let fragment = self.input.take(start);
                    self.input.consume(end - start);
                    self.search_from = 0;
                    return Ok(Some(fragment));
                }
                None if self.input.is_eof() => {
                    if pending.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(self.input.take_all()));
                }
                None => {
                    self.search_from = self.matcher.resume_from(pending.len());
                    self.input.refill()?;
                }
            }
        }
    }
}

impl Iterator for DelimiterSplitter {
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
