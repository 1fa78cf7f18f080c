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

//! `${...}` template mini-expressions
//!
//! A template is literal text interleaved with placeholders such as
//! `${header.orderId}` or `${body}`. Templates are parsed once at compile time
//! and rendered against each exchange.

use super::span::Spanned;
use crate::diagnostics::SyntaxError;
use crate::error::ExpressionResult;
use crate::model::{Exchange, TypeConverter, Value};
use std::fmt;

const FUNCTION_START: &str = "${";

/// Dotted prefixes and the scope they read from
const SCOPED_PREFIXES: &[(&str, Scope)] = &[
    ("in.headers.", Scope::Header),
    ("in.header.", Scope::Header),
    ("headers.", Scope::Header),
    ("header.", Scope::Header),
    ("exchangeProperty.", Scope::Property),
    ("variables.", Scope::Variable),
    ("variable.", Scope::Variable),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Header,
    Property,
    Variable,
}

/// A function call inside `${...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    /// `${body}`
    Body,
    /// `${exchangeId}`
    ExchangeId,
    /// `${header.NAME}`
    Header(String),
    /// `${exchangeProperty.NAME}`
    Property(String),
    /// `${variable.NAME}`
    Variable(String),
}

impl Function {
    /// Read the function's value off the exchange
    pub fn evaluate(&self, exchange: &Exchange) -> Value {
        let found = match self {
            Function::Body => Some(exchange.body()),
            Function::ExchangeId => return Value::from(exchange.id()),
            Function::Header(name) => exchange.header(name),
            Function::Property(name) => exchange.property(name),
            Function::Variable(name) => exchange.variable(name),
        };
        found.cloned().unwrap_or_default()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Body => write!(f, "${{body}}"),
            Function::ExchangeId => write!(f, "${{exchangeId}}"),
            Function::Header(name) => write!(f, "${{header.{name}}}"),
            Function::Property(name) => write!(f, "${{exchangeProperty.{name}}}"),
            Function::Variable(name) => write!(f, "${{variable.{name}}}"),
        }
    }
}

/// One piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text copied as-is
    Literal(String),
    /// A placeholder evaluated per exchange
    Function(Function),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    parts: Vec<Spanned<TemplatePart>>,
}

impl Template {
    /// The text the template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed parts with their character spans
    pub fn parts(&self) -> &[Spanned<TemplatePart>] {
        &self.parts
    }

    /// True when the template is exactly one placeholder
    pub fn is_single_function(&self) -> bool {
        matches!(
            self.parts.as_slice(),
            [Spanned {
                value: TemplatePart::Function(_),
                ..
            }]
        )
    }

    /// Evaluate against an exchange
    ///
    /// A lone placeholder yields its raw value; anything else is rendered to
    /// text and concatenated.
    pub fn evaluate(&self, exchange: &Exchange, converter: &TypeConverter) -> ExpressionResult<Value> {
        if let [Spanned {
            value: TemplatePart::Function(function),
            ..
        }] = self.parts.as_slice()
        {
            return Ok(function.evaluate(exchange));
        }
        self.render(exchange, converter).map(Value::String)
    }

    /// Render to text; null placeholders render as empty
    pub fn render(&self, exchange: &Exchange, converter: &TypeConverter) -> ExpressionResult<String> {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match &part.value {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Function(function) => {
                    out.push_str(&converter.to_text(function.evaluate(exchange))?)
                }
            }
        }
        Ok(out)
    }
}

/// Check whether `source` contains a `${...}` placeholder opener
pub fn contains_function(source: &str) -> bool {
    source.contains(FUNCTION_START)
}

/// Parse a template
pub fn parse_template(source: &str) -> Result<Template, SyntaxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_function_start(&chars, i) {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        if !literal.is_empty() {
            parts.push(Spanned::new(
                TemplatePart::Literal(std::mem::take(&mut literal)),
                literal_start,
                i,
            ));
        }

        let start = i;
        let content_start = i + 2;
        let mut close = None;
        let mut j = content_start;
        while j < chars.len() {
            if chars[j] == '}' {
                close = Some(j);
                break;
            }
            if is_function_start(&chars, j) {
                return Err(SyntaxError::new(
                    source,
                    j,
                    "nested functions are not supported",
                ));
            }
            j += 1;
        }
        let Some(close) = close else {
            return Err(SyntaxError::new(
                source,
                start,
                "expected '}' to close function",
            ));
        };

        let content: String = chars[content_start..close].iter().collect();
        let function = parse_function(source, &content, content_start)?;
        parts.push(Spanned::new(TemplatePart::Function(function), start, close + 1));

        i = close + 1;
        literal_start = i;
    }

    if !literal.is_empty() {
        parts.push(Spanned::new(
            TemplatePart::Literal(literal),
            literal_start,
            chars.len(),
        ));
    }

    Ok(Template {
        source: source.to_string(),
        parts,
    })
}

fn is_function_start(chars: &[char], at: usize) -> bool {
    chars.get(at) == Some(&'$') && chars.get(at + 1) == Some(&'{')
}

fn parse_function(source: &str, content: &str, offset: usize) -> Result<Function, SyntaxError> {
    let leading = content.chars().take_while(|c| c.is_whitespace()).count();
    let name = content.trim();
    let name_start = offset + leading;

    if name.is_empty() {
        return Err(SyntaxError::new(source, offset, "empty function"));
    }

    match name {
        "body" | "in.body" => return Ok(Function::Body),
        "exchangeId" => return Ok(Function::ExchangeId),
        _ => {}
    }

    for (prefix, scope) in SCOPED_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            let key = rest.trim();
            if key.is_empty() {
                return Err(SyntaxError::new(
                    source,
                    name_start + prefix.chars().count(),
                    format!("missing name after '{prefix}'"),
                ));
            }
            let key = key.to_string();
            return Ok(match scope {
                Scope::Header => Function::Header(key),
                Scope::Property => Function::Property(key),
                Scope::Variable => Function::Variable(key),
            });
        }
    }

    Err(SyntaxError::new(
        source,
        name_start,
        format!("unknown function: {name}"),
    ))
}
