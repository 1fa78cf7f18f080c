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

//! The process-wide language table is installed once and never replaced

use routeflow_expression::{EvaluationContext, ExpressionError, LanguageRegistry, SimpleRegistry};
use std::sync::Arc;

fn standard() -> LanguageRegistry {
    LanguageRegistry::standard(EvaluationContext::new(Arc::new(SimpleRegistry::new()))).unwrap()
}

#[test]
fn test_install_global_once() {
    assert_eq!(
        LanguageRegistry::global().unwrap_err(),
        ExpressionError::NotInitialized
    );

    let installed = LanguageRegistry::install_global(standard()).unwrap();
    assert!(installed.contains("tokenize"));
    assert!(std::ptr::eq(installed, LanguageRegistry::global().unwrap()));

    assert_eq!(
        LanguageRegistry::install_global(standard()).unwrap_err(),
        ExpressionError::AlreadyInitialized
    );
}
