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

//! Engine-wide configuration options

use crate::error::{ExpressionError, ExpressionResult};
use crate::model::Charset;
use serde::{Deserialize, Serialize};

/// Default number of bytes pulled from a body per refill
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Default name of the element that wraps grouped XML fragments
pub const DEFAULT_XML_GROUP_TAG: &str = "group";

/// Configuration shared by every expression bound to an evaluation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Charset used to decode bodies and produced fragments
    pub default_charset: Charset,

    /// Bytes read from the body per refill by the streaming splitters
    pub read_buffer_size: usize,

    /// Synthetic element name used when grouping XML fragments
    pub xml_group_tag: String,

    /// Optional upper bound on a single fragment, in bytes
    pub max_fragment_size: Option<usize>,
}

impl EngineConfig {
    /// Create a configuration with custom settings
    pub fn new(
        default_charset: Charset,
        read_buffer_size: usize,
        max_fragment_size: Option<usize>,
    ) -> Self {
        Self {
            default_charset,
            read_buffer_size,
            xml_group_tag: DEFAULT_XML_GROUP_TAG.to_string(),
            max_fragment_size,
        }
    }

    /// Create a configuration optimized for low memory usage
    pub fn low_memory() -> Self {
        Self {
            read_buffer_size: 512,
            max_fragment_size: Some(1024 * 1024),
            ..Self::default()
        }
    }

    /// Create a configuration for testing
    ///
    /// The tiny read buffer forces delimiters to straddle refills.
    pub fn testing() -> Self {
        Self {
            read_buffer_size: 3,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> ExpressionResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| ExpressionError::configuration(format!("invalid engine config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the splitters cannot work with
    pub fn validate(&self) -> ExpressionResult<()> {
        if self.read_buffer_size == 0 {
            return Err(ExpressionError::configuration(
                "readBufferSize must be greater than zero",
            ));
        }
        if self.xml_group_tag.trim().is_empty() {
            return Err(ExpressionError::configuration(
                "xmlGroupTag must not be empty",
            ));
        }
        if self.max_fragment_size == Some(0) {
            return Err(ExpressionError::configuration(
                "maxFragmentSize must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_charset: Charset::Utf8,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            xml_group_tag: DEFAULT_XML_GROUP_TAG.to_string(),
            max_fragment_size: None,
        }
    }
}
