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

//! Value model for expression evaluation
//!
//! Values, the exchange they are read from, single-use body streams and the
//! lazy sequences produced by tokenizers.

pub mod exchange;
pub mod lazy;
pub mod stream;
pub mod type_coercion;
pub mod value;

pub use exchange::Exchange;
pub use lazy::{LazySequence, SequenceItem};
pub use stream::{BodyStream, BoxedReader};
pub use type_coercion::{Charset, CoercionError, CoercionResult, TypeConverter};
pub use value::{Value, ValueType};
