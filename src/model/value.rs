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

//! Core value types flowing through expressions

use super::lazy::LazySequence;
use super::stream::BodyStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A value read from or produced for an exchange
///
/// Streams and sequences are single-pass handles: cloning a `Value` shares
/// the same cursor rather than duplicating the underlying data.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Floating point value
    Decimal(f64),

    /// Text value
    String(String),

    /// Raw bytes
    Bytes(Vec<u8>),

    /// Materialized list of values
    List(Vec<Value>),

    /// Single-use reader over a body that has not been read yet
    Stream(BodyStream),

    /// Lazily produced, single-pass sequence
    Sequence(LazySequence),
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Stream(_) => "Stream",
            Self::Sequence(_) => "Sequence",
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the lazy sequence, if this value is one
    pub fn as_sequence(&self) -> Option<&LazySequence> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Take the lazy sequence out of this value
    pub fn into_sequence(self) -> Option<LazySequence> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Interpret the value as a predicate outcome
    ///
    /// Booleans are taken as-is and the strings `"true"`/`"false"` are parsed
    /// (trimmed, case-insensitive). Empty lists and sequences are false, as is
    /// null. Anything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::String(s) => !s.trim().eq_ignore_ascii_case("false"),
            Self::List(items) => !items.is_empty(),
            Self::Sequence(seq) => seq.has_next(),
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Stream(a), Self::Stream(b)) => a.ptr_eq(b),
            (Self::Sequence(a), Self::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Self::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Stream(stream) => stream.fmt(f),
            Self::Sequence(seq) => seq.fmt(f),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<BodyStream> for Value {
    fn from(stream: BodyStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<LazySequence> for Value {
    fn from(seq: LazySequence) -> Self {
        Self::Sequence(seq)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Target type for result coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    /// No conversion; the value is returned as produced
    #[default]
    Any,
    /// Text
    String,
    /// 64-bit integer
    Integer,
    /// Floating point
    Decimal,
    /// Boolean
    Boolean,
    /// Raw bytes
    Bytes,
    /// Materialized list
    List,
}

impl ValueType {
    /// True when no conversion is requested
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "object" => Ok(Self::Any),
            "string" | "str" | "text" => Ok(Self::String),
            "int" | "integer" | "long" | "i64" => Ok(Self::Integer),
            "double" | "float" | "decimal" | "f64" => Ok(Self::Decimal),
            "bool" | "boolean" => Ok(Self::Boolean),
            "bytes" | "byte[]" | "binary" => Ok(Self::Bytes),
            "list" | "array" => Ok(Self::List),
            other => Err(format!("unknown result type '{other}'")),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "Any",
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Bytes => "Bytes",
            Self::List => "List",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::from(" FALSE ").is_truthy());
        assert!(Value::from("true").is_truthy());
        assert!(Value::from("anything").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Integer(0).is_truthy());
    }

    #[test]
    fn test_sequence_truthiness_does_not_lose_elements() {
        let seq = LazySequence::from_values(vec![Value::from("a")]);
        let value = Value::Sequence(seq.clone());
        assert!(value.is_truthy());
        let items: Vec<_> = seq.map(|item| item.unwrap()).collect();
        assert_eq!(items, vec![Value::from("a")]);
    }

    #[test]
    fn test_value_type_parsing() {
        assert_eq!("String".parse::<ValueType>().unwrap(), ValueType::String);
        assert_eq!("long".parse::<ValueType>().unwrap(), ValueType::Integer);
        assert_eq!("".parse::<ValueType>().unwrap(), ValueType::Any);
        assert!("Widget".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Integer(3));
    }
}
