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

//! Tokenizer configuration and its validation

use crate::error::{ExpressionError, ExpressionResult};
use crate::language::{LanguageOption, Scope};
use crate::model::ValueType;
use std::fmt;
use std::str::FromStr;

/// Names of the positional tokenizer options, in order
pub const OPTION_NAMES: [&str; 11] = [
    "resultType",
    "source",
    "token",
    "endToken",
    "inheritNamespaceTagName",
    "groupDelimiter",
    "regex",
    "xml",
    "includeTokens",
    "group",
    "skipFirst",
];

static UNSET: LanguageOption = LanguageOption::Null;

/// Where the tokenizer reads the text to split
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// The message body
    #[default]
    Body,
    /// A named header
    Header(String),
    /// A named exchange property
    Property(String),
    /// A named variable
    Variable(String),
}

impl InputSource {
    /// The accessor scope and slot name this source reads
    pub fn scope(&self) -> (Scope, &str) {
        match self {
            InputSource::Body => (Scope::Body, ""),
            InputSource::Header(name) => (Scope::Header, name),
            InputSource::Property(name) => (Scope::Property, name),
            InputSource::Variable(name) => (Scope::Variable, name),
        }
    }
}

impl FromStr for InputSource {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "body" {
            return Ok(InputSource::Body);
        }
        let (kind, name) = s.split_once(':').ok_or_else(|| {
            ExpressionError::configuration(format!(
                "invalid tokenizer source '{s}', expected header:, variable: or property:"
            ))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ExpressionError::configuration(format!(
                "tokenizer source '{s}' is missing a name"
            )));
        }
        match kind.trim() {
            "header" => Ok(InputSource::Header(name.to_string())),
            "property" | "exchangeProperty" => Ok(InputSource::Property(name.to_string())),
            "variable" => Ok(InputSource::Variable(name.to_string())),
            other => Err(ExpressionError::configuration(format!(
                "unknown tokenizer source kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Body => write!(f, "body"),
            InputSource::Header(name) => write!(f, "header:{name}"),
            InputSource::Property(name) => write!(f, "property:{name}"),
            InputSource::Variable(name) => write!(f, "variable:{name}"),
        }
    }
}

/// The splitting strategy selected by a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerMode {
    /// Split on a literal delimiter
    Plain,
    /// Split on regular expression matches
    Regex,
    /// Extract text between start and end tokens
    Paired,
    /// Extract elements from markup
    Xml,
}

/// Immutable description of how to split a body
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerConfig {
    /// Delimiter, pattern, start token or element name depending on the mode
    pub token: String,
    /// End token; selects paired mode
    pub end_token: Option<String>,
    /// Ancestor whose namespace declarations are copied onto each element
    pub inherit_namespace_tag_name: Option<String>,
    /// Joins grouped fragments; defaults to `token`
    pub group_delimiter: Option<String>,
    /// Interpret `token` as a regular expression
    pub regex: bool,
    /// Split markup elements
    pub xml: bool,
    /// Keep start and end tokens in paired fragments
    pub include_tokens: bool,
    /// Number of fragments per group
    pub group: Option<usize>,
    /// Drop the first fragment
    pub skip_first: bool,
    /// Type each fragment is converted to
    pub result_type: ValueType,
    /// What to split
    pub source: InputSource,
}

impl TokenizerConfig {
    /// Split the body on a literal `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            end_token: None,
            inherit_namespace_tag_name: None,
            group_delimiter: None,
            regex: false,
            xml: false,
            include_tokens: false,
            group: None,
            skip_first: false,
            result_type: ValueType::Any,
            source: InputSource::Body,
        }
    }

    /// Set the end token
    pub fn with_end_token(mut self, end_token: impl Into<String>) -> Self {
        self.end_token = Some(end_token.into());
        self
    }

    /// Set the ancestor to inherit namespace declarations from (`*` for all)
    pub fn with_inherit_namespace_tag_name(mut self, name: impl Into<String>) -> Self {
        self.inherit_namespace_tag_name = Some(name.into());
        self
    }

    /// Set the group delimiter
    pub fn with_group_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.group_delimiter = Some(delimiter.into());
        self
    }

    /// Toggle regex mode
    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Toggle xml mode
    pub fn with_xml(mut self, xml: bool) -> Self {
        self.xml = xml;
        self
    }

    /// Toggle token inclusion in paired mode
    pub fn with_include_tokens(mut self, include_tokens: bool) -> Self {
        self.include_tokens = include_tokens;
        self
    }

    /// Group fragments `size` at a time
    pub fn with_group(mut self, size: usize) -> Self {
        self.group = Some(size);
        self
    }

    /// Toggle skipping the first fragment
    pub fn with_skip_first(mut self, skip_first: bool) -> Self {
        self.skip_first = skip_first;
        self
    }

    /// Set the per-fragment result type
    pub fn with_result_type(mut self, result_type: ValueType) -> Self {
        self.result_type = result_type;
        self
    }

    /// Set the input source
    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }

    /// Build from the tokenizer language's positional options
    ///
    /// An unset token option falls back to `source`. The result is validated.
    pub fn from_options(source: &str, options: &[LanguageOption]) -> ExpressionResult<Self> {
        if options.len() > OPTION_NAMES.len() {
            return Err(ExpressionError::configuration(format!(
                "tokenizer accepts at most {} options, got {}",
                OPTION_NAMES.len(),
                options.len()
            )));
        }
        let option = |index: usize| options.get(index).unwrap_or(&UNSET);

        let mut config = TokenizerConfig::new(source);
        if let Some(result_type) = typed(option(0), 0, LanguageOption::as_type)? {
            config.result_type = result_type;
        }
        if let Some(input) = typed(option(1), 1, LanguageOption::as_text)? {
            config.source = input.parse()?;
        }
        if let Some(token) = typed(option(2), 2, LanguageOption::as_text)? {
            config.token = token.to_string();
        }
        config.end_token = typed(option(3), 3, LanguageOption::as_text)?.map(str::to_string);
        config.inherit_namespace_tag_name =
            typed(option(4), 4, LanguageOption::as_text)?.map(str::to_string);
        config.group_delimiter = typed(option(5), 5, LanguageOption::as_text)?.map(str::to_string);
        config.regex = typed(option(6), 6, LanguageOption::as_bool)?.unwrap_or(false);
        config.xml = typed(option(7), 7, LanguageOption::as_bool)?.unwrap_or(false);
        config.include_tokens = typed(option(8), 8, LanguageOption::as_bool)?.unwrap_or(false);
        config.group = match typed(option(9), 9, LanguageOption::as_int)? {
            Some(size) if size > 0 => Some(size as usize),
            Some(size) => {
                return Err(ExpressionError::configuration(format!(
                    "group must be a positive number, got {size}"
                )));
            }
            None => None,
        };
        config.skip_first = typed(option(10), 10, LanguageOption::as_bool)?.unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// The splitting strategy this configuration selects
    pub fn mode(&self) -> TokenizerMode {
        if self.xml {
            TokenizerMode::Xml
        } else if self.end_token.is_some() {
            TokenizerMode::Paired
        } else if self.regex {
            TokenizerMode::Regex
        } else {
            TokenizerMode::Plain
        }
    }

    /// Reject conflicting or incomplete settings
    pub fn validate(&self) -> ExpressionResult<()> {
        if self.xml && (self.end_token.is_some() || self.include_tokens) {
            return Err(ExpressionError::configuration(
                "xml mode cannot be combined with endToken or includeTokens",
            ));
        }
        if self.end_token.is_some() && self.inherit_namespace_tag_name.is_some() {
            return Err(ExpressionError::configuration(
                "endToken cannot be combined with inheritNamespaceTagName",
            ));
        }
        if self.include_tokens && self.end_token.is_none() {
            return Err(ExpressionError::configuration(
                "includeTokens requires endToken",
            ));
        }
        if self.xml && self.regex {
            return Err(ExpressionError::configuration(
                "xml mode cannot be combined with regex",
            ));
        }
        if self.regex && self.end_token.is_some() {
            return Err(ExpressionError::configuration(
                "regex cannot be combined with endToken",
            ));
        }
        if self.inherit_namespace_tag_name.is_some() && !self.xml {
            return Err(ExpressionError::configuration(
                "inheritNamespaceTagName requires xml mode",
            ));
        }
        if self.token.is_empty() {
            return Err(ExpressionError::configuration("token must not be empty"));
        }
        if self.end_token.as_deref() == Some("") {
            return Err(ExpressionError::configuration("endToken must not be empty"));
        }
        if self.group == Some(0) {
            return Err(ExpressionError::configuration(
                "group must be a positive number, got 0",
            ));
        }
        if self.xml && element_name(&self.token).is_empty() {
            return Err(ExpressionError::configuration(format!(
                "'{}' is not an element name",
                self.token
            )));
        }
        Ok(())
    }

    /// Delimiter placed between grouped fragments
    pub fn effective_group_delimiter(&self) -> &str {
        self.group_delimiter.as_deref().unwrap_or(&self.token)
    }
}

/// Strip tag punctuation from an xml token: `<ns:order>` becomes `ns:order`
pub fn element_name(token: &str) -> &str {
    let name = token.trim();
    let name = name.strip_prefix('<').unwrap_or(name);
    let name = name.strip_suffix('>').unwrap_or(name);
    let name = name.strip_suffix('/').unwrap_or(name);
    name.split_whitespace().next().unwrap_or("")
}

fn typed<'a, T>(
    option: &'a LanguageOption,
    index: usize,
    read: impl FnOnce(&'a LanguageOption) -> Option<T>,
) -> ExpressionResult<Option<T>> {
    if option.is_null() {
        return Ok(None);
    }
    read(option).map(Some).ok_or_else(|| {
        ExpressionError::configuration(format!(
            "invalid value {option:?} for tokenizer option {index} ({})",
            OPTION_NAMES[index]
        ))
    })
}
