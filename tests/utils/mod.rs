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

//! Shared helpers for the integration tests

#![allow(dead_code)]

use routeflow_expression::model::BodyStream;
use routeflow_expression::{
    EngineConfig, EvaluationContext, Exchange, ExpressionResult, LanguageOption, LanguageRegistry,
    SimpleRegistry, Value,
};
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Languages over a fresh bean registry
pub struct TestContext {
    pub beans: Arc<SimpleRegistry>,
    pub languages: LanguageRegistry,
}

impl TestContext {
    /// Standard languages with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Standard languages with `config`
    pub fn with_config(config: EngineConfig) -> Self {
        init_logging();
        let beans = Arc::new(SimpleRegistry::new());
        let context = EvaluationContext::with_config(config, beans.clone()).unwrap();
        let languages = LanguageRegistry::standard(context).unwrap();
        Self { beans, languages }
    }

    /// Tokenize `body` with positional options and collect the fragments as text
    pub fn tokenize(&self, body: impl Into<Value>, options: &[LanguageOption]) -> ExpressionResult<Vec<String>> {
        let expression = self.languages.create_expression("tokenize", "", options)?;
        let mut exchange = Exchange::with_body(body);
        let sequence = expression
            .evaluate(&mut exchange)?
            .into_sequence()
            .expect("tokenizer yields a sequence");
        sequence
            .map(|item| item.map(|value| value.as_str().unwrap_or_default().to_string()))
            .collect()
    }
}

/// Positional tokenizer options, unset slots left null
#[derive(Debug, Default, Clone)]
pub struct TokenizeOptions {
    pub result_type: Option<&'static str>,
    pub source: Option<&'static str>,
    pub token: Option<&'static str>,
    pub end_token: Option<&'static str>,
    pub inherit_namespace_tag_name: Option<&'static str>,
    pub group_delimiter: Option<&'static str>,
    pub regex: bool,
    pub xml: bool,
    pub include_tokens: bool,
    pub group: Option<i64>,
    pub skip_first: bool,
}

impl TokenizeOptions {
    /// Split on `token`
    pub fn token(token: &'static str) -> Self {
        Self {
            token: Some(token),
            ..Self::default()
        }
    }

    /// The options in slot order
    pub fn to_options(&self) -> Vec<LanguageOption> {
        vec![
            self.result_type.into(),
            self.source.into(),
            self.token.into(),
            self.end_token.into(),
            self.inherit_namespace_tag_name.into(),
            self.group_delimiter.into(),
            self.regex.into(),
            self.xml.into(),
            self.include_tokens.into(),
            self.group.into(),
            self.skip_first.into(),
        ]
    }
}

/// A body that records when it is dropped
pub struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    dropped: Arc<AtomicBool>,
}

impl TrackedBody {
    /// Wrap `body`, returning the stream and its drop flag
    pub fn stream(body: &str) -> (BodyStream, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let body = TrackedBody {
            inner: Cursor::new(body.as_bytes().to_vec()),
            dropped: dropped.clone(),
        };
        (BodyStream::new(body), dropped)
    }
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Install the test logger once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
