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

//! Parser for the `${...}` mini-expression language
//!
//! Used by the `simple` language and by dynamic references, whose target name
//! is itself computed from the exchange.

pub mod span;
pub mod template;

pub use span::Spanned;
pub use template::{Function, Template, TemplatePart, contains_function, parse_template};
