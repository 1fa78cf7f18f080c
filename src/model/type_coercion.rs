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

//! Type coercion and conversion utilities

use super::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;

/// Result type for type coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that can occur during type coercion
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Cannot coerce between the specified types
    IncompatibleTypes { from: String, to: String },
    /// The value format is invalid for the target type
    InvalidFormat { value: String, target_type: String },
    /// A stream body was already read by someone else
    StreamConsumed,
    /// Reading a stream body failed during conversion
    ReadFailed { message: String },
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoercionError::IncompatibleTypes { from, to } => {
                write!(f, "Cannot coerce from {from} to {to}")
            }
            CoercionError::InvalidFormat { value, target_type } => {
                write!(f, "Invalid format '{value}' for type {target_type}")
            }
            CoercionError::StreamConsumed => {
                write!(f, "Cannot coerce a stream body that has already been read")
            }
            CoercionError::ReadFailed { message } => {
                write!(f, "Failed to read stream body: {message}")
            }
        }
    }
}

impl std::error::Error for CoercionError {}

/// Character set used when turning bytes into text and back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Charset {
    /// UTF-8; invalid sequences are replaced
    #[default]
    #[serde(rename = "UTF-8", alias = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1, one byte per character
    #[serde(rename = "ISO-8859-1", alias = "iso-8859-1", alias = "latin1")]
    Latin1,
}

impl Charset {
    /// Decode bytes into text
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Encode text into bytes; unmappable characters become `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            other => Err(format!("unsupported charset '{other}'")),
        }
    }
}

/// Converts values between the types an expression may be asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeConverter {
    charset: Charset,
}

impl TypeConverter {
    /// Create a converter that decodes bytes with `charset`
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }

    /// The charset used for byte/text conversions
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Attempt to coerce a value to the specified type
    ///
    /// Null converts to null for every target. A lazy sequence is only drained
    /// when a `List` is explicitly requested.
    pub fn convert(&self, value: Value, target: ValueType) -> CoercionResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match target {
            ValueType::Any => Ok(value),
            ValueType::String => self.to_text(value).map(Value::String),
            ValueType::Integer => self.coerce_to_integer(value),
            ValueType::Decimal => self.coerce_to_decimal(value),
            ValueType::Boolean => self.coerce_to_boolean(value),
            ValueType::Bytes => self.coerce_to_bytes(value),
            ValueType::List => self.coerce_to_list(value),
        }
    }

    /// Render a value as text
    ///
    /// Null renders as the empty string.
    pub fn to_text(&self, value: Value) -> CoercionResult<String> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Bytes(bytes) => Ok(self.charset.decode(&bytes)),
            Value::Stream(stream) => {
                let bytes = self.read_stream(&stream)?;
                Ok(self.charset.decode(&bytes))
            }
            other => Err(CoercionError::IncompatibleTypes {
                from: other.type_name().to_string(),
                to: ValueType::String.to_string(),
            }),
        }
    }

    /// Coerce value to integer
    pub fn coerce_to_integer(&self, value: Value) -> CoercionResult<Value> {
        match value {
            Value::Integer(i) => Ok(Value::Integer(i)),
            Value::Decimal(d) => {
                if d.fract() == 0.0 && d >= i64::MIN as f64 && d <= i64::MAX as f64 {
                    Ok(Value::Integer(d as i64))
                } else {
                    Err(CoercionError::InvalidFormat {
                        value: d.to_string(),
                        target_type: "Integer".to_string(),
                    })
                }
            }
            Value::Boolean(b) => Ok(Value::Integer(i64::from(b))),
            Value::String(_) | Value::Bytes(_) | Value::Stream(_) => {
                let text = self.to_text(value)?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| CoercionError::InvalidFormat {
                        value: text,
                        target_type: "Integer".to_string(),
                    })
            }
            other => Err(CoercionError::IncompatibleTypes {
                from: other.type_name().to_string(),
                to: "Integer".to_string(),
            }),
        }
    }

    /// Coerce value to decimal
    pub fn coerce_to_decimal(&self, value: Value) -> CoercionResult<Value> {
        match value {
            Value::Decimal(d) => Ok(Value::Decimal(d)),
            Value::Integer(i) => Ok(Value::Decimal(i as f64)),
            Value::String(_) | Value::Bytes(_) | Value::Stream(_) => {
                let text = self.to_text(value)?;
                text.trim()
                    .parse::<f64>()
                    .map(Value::Decimal)
                    .map_err(|_| CoercionError::InvalidFormat {
                        value: text,
                        target_type: "Decimal".to_string(),
                    })
            }
            other => Err(CoercionError::IncompatibleTypes {
                from: other.type_name().to_string(),
                to: "Decimal".to_string(),
            }),
        }
    }

    /// Coerce value to boolean
    pub fn coerce_to_boolean(&self, value: Value) -> CoercionResult<Value> {
        match value {
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            Value::Integer(i) => Ok(Value::Boolean(i != 0)),
            Value::String(_) | Value::Bytes(_) | Value::Stream(_) => {
                let text = self.to_text(value)?;
                match text.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Boolean(true)),
                    "false" => Ok(Value::Boolean(false)),
                    _ => Err(CoercionError::InvalidFormat {
                        value: text,
                        target_type: "Boolean".to_string(),
                    }),
                }
            }
            other => Err(CoercionError::IncompatibleTypes {
                from: other.type_name().to_string(),
                to: "Boolean".to_string(),
            }),
        }
    }

    /// Coerce value to bytes
    pub fn coerce_to_bytes(&self, value: Value) -> CoercionResult<Value> {
        match value {
            Value::Bytes(bytes) => Ok(Value::Bytes(bytes)),
            Value::String(s) => Ok(Value::Bytes(self.charset.encode(&s))),
            Value::Stream(stream) => self.read_stream(&stream).map(Value::Bytes),
            other @ (Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_)) => {
                let text = self.to_text(other)?;
                Ok(Value::Bytes(self.charset.encode(&text)))
            }
            other => Err(CoercionError::IncompatibleTypes {
                from: other.type_name().to_string(),
                to: "Bytes".to_string(),
            }),
        }
    }

    /// Coerce value to a materialized list
    pub fn coerce_to_list(&self, value: Value) -> CoercionResult<Value> {
        match value {
            Value::List(items) => Ok(Value::List(items)),
            Value::Sequence(seq) => {
                let mut items = Vec::new();
                for item in seq {
                    let item = item.map_err(|err| CoercionError::ReadFailed {
                        message: err.to_string(),
                    })?;
                    items.push(item);
                }
                Ok(Value::List(items))
            }
            single => Ok(Value::List(vec![single])),
        }
    }

    fn read_stream(&self, stream: &super::BodyStream) -> CoercionResult<Vec<u8>> {
        let mut reader = stream.take().ok_or(CoercionError::StreamConsumed)?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| CoercionError::ReadFailed {
                message: err.to_string(),
            })?;
        Ok(bytes)
    }
}
