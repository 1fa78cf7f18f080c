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

//! Integration tests for the tokenize language

use pretty_assertions::assert_eq;
use routeflow_expression::model::BodyStream;
use routeflow_expression::{EngineConfig, Exchange, ExpressionError, Value};
use rstest::rstest;
use std::io::Cursor;
use std::sync::atomic::Ordering;

mod utils;
use utils::{TestContext, TokenizeOptions, TrackedBody};

fn tokenize(body: &str, options: TokenizeOptions) -> Vec<String> {
    TestContext::new()
        .tokenize(body, &options.to_options())
        .unwrap()
}

#[rstest]
#[case::three_tokens("a,b,c", vec!["a", "b", "c"])]
#[case::empty_body("", vec![])]
#[case::token_absent("no commas here", vec!["no commas here"])]
fn test_plain_split(#[case] body: &str, #[case] expected: Vec<&str>) {
    assert_eq!(tokenize(body, TokenizeOptions::token(",")), expected);
}

#[test]
fn test_paired_split() {
    let options = TokenizeOptions {
        end_token: Some("</x>"),
        ..TokenizeOptions::token("<x>")
    };
    assert_eq!(tokenize("<x>1</x><x>2</x>", options.clone()), vec!["1", "2"]);

    let options = TokenizeOptions {
        include_tokens: true,
        ..options
    };
    assert_eq!(
        tokenize("<x>1</x><x>2</x>", options),
        vec!["<x>1</x>", "<x>2</x>"]
    );
}

#[test]
fn test_regex_split() {
    let options = TokenizeOptions {
        regex: true,
        ..TokenizeOptions::token(r"\d+")
    };
    assert_eq!(tokenize("a1b22c", options), vec!["a", "b", "c"]);
}

#[test]
fn test_group_keeps_final_partial_group() {
    let options = TokenizeOptions {
        group: Some(2),
        ..TokenizeOptions::token(",")
    };
    assert_eq!(tokenize("a,b,c,d,e", options), vec!["a,b", "c,d", "e"]);
}

#[test]
fn test_group_delimiter() {
    let options = TokenizeOptions {
        group: Some(3),
        group_delimiter: Some("|"),
        ..TokenizeOptions::token("\n")
    };
    assert_eq!(tokenize("1\n2\n3\n4\n", options), vec!["1|2|3", "4"]);
}

#[test]
fn test_skip_first_without_group() {
    let options = TokenizeOptions {
        skip_first: true,
        ..TokenizeOptions::token(",")
    };
    assert_eq!(tokenize("h,a,b", options), vec!["a", "b"]);
}

/// The grouping decorator alone drops the header; `a` must survive.
#[test]
fn test_skip_first_with_group_skips_once() {
    let options = TokenizeOptions {
        skip_first: true,
        group: Some(2),
        ..TokenizeOptions::token(",")
    };
    assert_eq!(tokenize("h,a,b,c", options), vec!["a,b", "c"]);
}

#[rstest]
#[case::xml_with_end_token(TokenizeOptions { xml: true, end_token: Some("</x>"), ..TokenizeOptions::token("x") })]
#[case::xml_with_include_tokens(TokenizeOptions { xml: true, include_tokens: true, ..TokenizeOptions::token("x") })]
#[case::include_without_end(TokenizeOptions { include_tokens: true, ..TokenizeOptions::token("x") })]
#[case::end_token_with_inherit(TokenizeOptions {
    end_token: Some("y"),
    inherit_namespace_tag_name: Some("r"),
    ..TokenizeOptions::token("x")
})]
fn test_conflicting_options_fail_at_compile_time(#[case] options: TokenizeOptions) {
    let context = TestContext::new();
    let err = context
        .languages
        .create_expression("tokenize", "", &options.to_options())
        .unwrap_err();
    assert!(matches!(err, ExpressionError::Configuration { .. }), "{err:?}");
}

#[test]
fn test_xml_split_with_namespace_inheritance() {
    let body = concat!(
        r#"<orders xmlns="urn:o" xmlns:p="urn:p">"#,
        r#"<order><p:line>1</p:line></order>"#,
        r#"<order><p:line>2</p:line></order>"#,
        r#"</orders>"#
    );
    let options = TokenizeOptions {
        xml: true,
        inherit_namespace_tag_name: Some("orders"),
        ..TokenizeOptions::token("<order>")
    };
    assert_eq!(
        tokenize(body, options),
        vec![
            r#"<order xmlns="urn:o" xmlns:p="urn:p"><p:line>1</p:line></order>"#,
            r#"<order xmlns="urn:o" xmlns:p="urn:p"><p:line>2</p:line></order>"#,
        ]
    );
}

#[test]
fn test_xml_grouping_encloses_fragments() {
    let body = "<r><i>1</i><i>2</i><i>3</i></r>";
    let options = TokenizeOptions {
        xml: true,
        group: Some(2),
        ..TokenizeOptions::token("i")
    };
    assert_eq!(
        tokenize(body, options),
        vec!["<group><i>1</i><i>2</i></group>", "<group><i>3</i></group>"]
    );
}

#[test]
fn test_xml_group_tag_from_config() {
    let config = EngineConfig {
        xml_group_tag: "batch".to_string(),
        ..EngineConfig::default()
    };
    let options = TokenizeOptions {
        xml: true,
        group: Some(5),
        ..TokenizeOptions::token("i")
    };
    let fragments = TestContext::with_config(config)
        .tokenize("<r><i/><i/></r>", &options.to_options())
        .unwrap();
    assert_eq!(fragments, vec!["<batch><i/><i/></batch>"]);
}

#[test]
fn test_result_type_converts_lazily() {
    let options = TokenizeOptions {
        result_type: Some("int"),
        ..TokenizeOptions::token(",")
    };
    let context = TestContext::new();
    let expression = context
        .languages
        .create_expression("tokenize", "", &options.to_options())
        .unwrap();
    let mut exchange = Exchange::with_body("1,2,oops,4");
    let mut sequence = expression
        .evaluate(&mut exchange)
        .unwrap()
        .into_sequence()
        .unwrap();

    assert_eq!(sequence.next().unwrap().unwrap(), Value::Integer(1));
    assert_eq!(sequence.next().unwrap().unwrap(), Value::Integer(2));
    assert_eq!(sequence.produced(), 2);
    assert!(matches!(sequence.next(), Some(Err(ExpressionError::Coercion(_)))));
}

#[test]
fn test_large_streamed_body_with_small_buffer() {
    let lines: Vec<String> = (0..5_000).map(|i| format!("line-{i}")).collect();
    let body = lines.join("\n");
    let context = TestContext::with_config(EngineConfig::testing());
    let fragments = context
        .tokenize(
            BodyStream::new(Cursor::new(body.into_bytes())),
            &TokenizeOptions::token("\n").to_options(),
        )
        .unwrap();
    assert_eq!(fragments, lines);
}

#[test]
fn test_abandoned_sequence_releases_body() {
    let context = TestContext::new();
    let expression = context
        .languages
        .create_expression("tokenize", "", &TokenizeOptions::token(",").to_options())
        .unwrap();
    let (stream, dropped) = TrackedBody::stream("a,b,c,d");
    let mut exchange = Exchange::with_body(stream);

    let sequence = expression
        .evaluate(&mut exchange)
        .unwrap()
        .into_sequence()
        .unwrap();
    assert!(sequence.has_next());
    assert!(!dropped.load(Ordering::SeqCst));

    sequence.close();
    assert!(sequence.is_closed());
    assert!(dropped.load(Ordering::SeqCst));
}

#[test]
fn test_exhausted_sequence_releases_body() {
    let context = TestContext::new();
    let expression = context
        .languages
        .create_expression("tokenize", "", &TokenizeOptions::token(",").to_options())
        .unwrap();
    let (stream, dropped) = TrackedBody::stream("a,b");
    let mut exchange = Exchange::with_body(stream);

    let sequence = expression
        .evaluate(&mut exchange)
        .unwrap()
        .into_sequence()
        .unwrap();
    assert_eq!(sequence.try_collect().unwrap().len(), 2);
    assert!(dropped.load(Ordering::SeqCst));
}

#[test]
fn test_oversized_fragment_fails() {
    let config = EngineConfig {
        read_buffer_size: 4,
        max_fragment_size: Some(8),
        ..EngineConfig::default()
    };
    let result = TestContext::with_config(config).tokenize(
        "short,this fragment is far too long,x",
        &TokenizeOptions::token(",").to_options(),
    );
    assert!(matches!(result, Err(ExpressionError::Evaluation { .. })));
}

#[test]
fn test_split_header_instead_of_body() {
    let options = TokenizeOptions {
        source: Some("header:csv"),
        ..TokenizeOptions::token(",")
    };
    let context = TestContext::new();
    let expression = context
        .languages
        .create_expression("tokenize", "", &options.to_options())
        .unwrap();
    let mut exchange = Exchange::with_body("body,is,ignored");
    exchange.set_header("csv", "x,y");
    let values = expression
        .evaluate(&mut exchange)
        .unwrap()
        .into_sequence()
        .unwrap()
        .try_collect()
        .unwrap();
    assert_eq!(values, vec![Value::from("x"), Value::from("y")]);
}

#[test]
fn test_compiling_twice_gives_independent_equal_results() {
    let context = TestContext::new();
    let options = TokenizeOptions::token(";").to_options();
    let first = context
        .languages
        .create_expression("tokenize", "", &options)
        .unwrap();
    let second = context
        .languages
        .create_expression("tokenize", "", &options)
        .unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &second));

    let run = |expression: &dyn routeflow_expression::Expression| {
        let mut exchange = Exchange::with_body("1;2;3");
        expression
            .evaluate(&mut exchange)
            .unwrap()
            .into_sequence()
            .unwrap()
            .try_collect()
            .unwrap()
    };
    assert_eq!(run(first.as_ref()), run(second.as_ref()));
}
