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

//! Composes a tokenizer configuration into an expression

use super::config::{TokenizerConfig, TokenizerMode};
use super::delimiter::{DelimiterSplitter, Matcher};
use super::group::{GroupIterator, GroupJoin, SkipFirst};
use super::pair::PairSplitter;
use super::scanner::ChunkedInput;
use super::xml::{NamespaceInheritance, XmlSplitter};
use super::BoxedSplitter;
use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{ContextBinding, ConvertingExpression, EvaluationContext, Expression};
use crate::language::AccessorExpression;
use crate::model::{BoxedReader, Exchange, LazySequence, Value};
use std::io::Cursor;
use std::sync::Arc;

/// Builds tokenizer expressions
///
/// The configuration is validated before anything else, so conflicting
/// options fail here regardless of what will later be split.
pub struct TokenizerBuilder {
    config: TokenizerConfig,
    source: Option<Box<dyn Expression>>,
}

impl TokenizerBuilder {
    /// Start from `config`
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    /// Split the value of `source` instead of the configured input
    pub fn with_source(mut self, source: Box<dyn Expression>) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate and compose
    ///
    /// The result yields a [`Value::Sequence`]. A non-default result type
    /// wraps it in a converting adapter that converts each element lazily.
    pub fn build(self) -> ExpressionResult<Box<dyn Expression>> {
        let TokenizerBuilder { config, source } = self;
        config.validate()?;

        let matcher = match config.mode() {
            TokenizerMode::Regex => Some(Matcher::regex(&config.token)?),
            TokenizerMode::Plain => Some(Matcher::literal(&config.token)),
            TokenizerMode::Paired | TokenizerMode::Xml => None,
        };
        let source = source.unwrap_or_else(|| {
            let (scope, name) = config.source.scope();
            Box::new(AccessorExpression::new(scope, name))
        });
        log::debug!(
            "Built {:?} tokenizer on '{}' (group: {:?}, skip first: {}, result type: {})",
            config.mode(),
            config.token,
            config.group,
            config.skip_first,
            config.result_type
        );

        let result_type = config.result_type;
        let expression = TokenizerExpression {
            config,
            matcher,
            source,
            binding: ContextBinding::new(),
        };
        if result_type.is_any() {
            Ok(Box::new(expression))
        } else {
            Ok(Box::new(ConvertingExpression::new(Box::new(expression), result_type)))
        }
    }
}

/// Splits the value of its source expression into a lazy sequence
#[derive(Debug)]
pub struct TokenizerExpression {
    config: TokenizerConfig,
    matcher: Option<Matcher>,
    source: Box<dyn Expression>,
    binding: ContextBinding,
}

impl TokenizerExpression {
    /// The configuration this expression was built from
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    fn open(&self, value: Value, context: &EvaluationContext) -> ExpressionResult<Option<BoxedReader>> {
        let reader: BoxedReader = match value {
            Value::Null => return Ok(None),
            Value::Stream(stream) => stream.take().ok_or_else(|| {
                ExpressionError::evaluation("the body stream has already been consumed")
            })?,
            Value::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            Value::String(text) => Box::new(Cursor::new(context.charset().encode(&text))),
            other => {
                let text = context.converter().to_text(other)?;
                Box::new(Cursor::new(context.charset().encode(&text)))
            }
        };
        Ok(Some(reader))
    }

    fn splitter(&self, reader: BoxedReader, context: &EvaluationContext) -> BoxedSplitter {
        let config = &self.config;
        let engine = context.config();
        let base: BoxedSplitter = match config.mode() {
            TokenizerMode::Xml => Box::new(XmlSplitter::new(
                reader,
                &config.token,
                config
                    .inherit_namespace_tag_name
                    .as_deref()
                    .map(NamespaceInheritance::parse),
                engine.read_buffer_size,
                engine.max_fragment_size,
            )),
            TokenizerMode::Paired => Box::new(PairSplitter::new(
                chunked(reader, context),
                &config.token,
                config.end_token.as_deref().unwrap_or_default(),
                config.include_tokens,
            )),
            TokenizerMode::Plain | TokenizerMode::Regex => {
                let matcher = self
                    .matcher
                    .clone()
                    .unwrap_or_else(|| Matcher::literal(&config.token));
                Box::new(DelimiterSplitter::new(chunked(reader, context), matcher))
            }
        };

        match config.group {
            Some(size) => {
                let join = if config.xml {
                    GroupJoin::Enclose(engine.xml_group_tag.as_bytes().to_vec())
                } else {
                    GroupJoin::Delimiter(config.effective_group_delimiter().as_bytes().to_vec())
                };
                Box::new(GroupIterator::new(base, size, join, config.skip_first))
            }
            None if config.skip_first => Box::new(SkipFirst::new(base)),
            None => base,
        }
    }
}

fn chunked(reader: BoxedReader, context: &EvaluationContext) -> ChunkedInput {
    let engine = context.config();
    ChunkedInput::new(reader, engine.read_buffer_size, engine.max_fragment_size)
}

impl Expression for TokenizerExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding.bind(context)?;
        self.source.init(context)
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        let context = self.binding.get()?;
        let value = self.source.evaluate(exchange)?;
        let Some(reader) = self.open(value, context)? else {
            return Ok(Value::Sequence(LazySequence::empty()));
        };

        let charset = context.charset();
        let fragments = self
            .splitter(reader, context)
            .map(move |fragment| fragment.map(|bytes| Value::String(charset.decode(&bytes))));
        Ok(Value::Sequence(LazySequence::new(fragments)))
    }
}
