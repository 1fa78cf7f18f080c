use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use routeflow_expression::model::BodyStream;
use routeflow_expression::{
    EvaluationContext, Exchange, Expression, LanguageOption, LanguageRegistry, SimpleRegistry,
};
use std::io::Cursor;
use std::sync::Arc;

fn languages() -> LanguageRegistry {
    LanguageRegistry::standard(EvaluationContext::new(Arc::new(SimpleRegistry::new())))
        .expect("standard languages")
}

fn csv_body(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{i},customer-{i},{}.50", i % 97))
        .collect::<Vec<_>>()
        .join("\n")
}

fn xml_body(orders: usize) -> String {
    let mut body = String::from(r#"<orders xmlns="urn:orders">"#);
    for i in 0..orders {
        body.push_str(&format!(r#"<order id="{i}"><total>{i}.00</total></order>"#));
    }
    body.push_str("</orders>");
    body
}

fn drain(expression: &dyn Expression, body: &str) -> usize {
    let mut exchange = Exchange::with_body(BodyStream::new(Cursor::new(body.as_bytes().to_vec())));
    let sequence = expression
        .evaluate(&mut exchange)
        .expect("evaluation")
        .into_sequence()
        .expect("sequence");
    sequence.filter(Result::is_ok).count()
}

fn options(slots: &[(usize, LanguageOption)]) -> Vec<LanguageOption> {
    let mut options = vec![LanguageOption::Null; 11];
    for (index, option) in slots {
        options[*index] = option.clone();
    }
    options
}

fn benchmark_plain_split(c: &mut Criterion) {
    let languages = languages();
    let body = csv_body(10_000);
    let expression = languages
        .create_expression("tokenize", "\n", &[])
        .expect("tokenizer");

    let mut group = c.benchmark_group("plain_split");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("lines", |b| {
        b.iter(|| black_box(drain(expression.as_ref(), black_box(&body))))
    });
    group.finish();
}

fn benchmark_regex_split(c: &mut Criterion) {
    let languages = languages();
    let body = csv_body(10_000);
    let expression = languages
        .create_expression("tokenize", r"[\n,]", &options(&[(2, r"[\n,]".into()), (6, true.into())]))
        .expect("tokenizer");

    let mut group = c.benchmark_group("regex_split");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("fields", |b| {
        b.iter(|| black_box(drain(expression.as_ref(), black_box(&body))))
    });
    group.finish();
}

fn benchmark_xml_split(c: &mut Criterion) {
    let languages = languages();
    let body = xml_body(5_000);
    let plain = languages
        .create_expression("tokenize", "order", &options(&[(7, true.into())]))
        .expect("tokenizer");
    let inheriting = languages
        .create_expression(
            "tokenize",
            "order",
            &options(&[(4, "orders".into()), (7, true.into())]),
        )
        .expect("tokenizer");

    let mut group = c.benchmark_group("xml_split");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("elements", |b| {
        b.iter(|| black_box(drain(plain.as_ref(), black_box(&body))))
    });
    group.bench_function("elements_with_namespaces", |b| {
        b.iter(|| black_box(drain(inheriting.as_ref(), black_box(&body))))
    });
    group.finish();
}

fn benchmark_grouped_split(c: &mut Criterion) {
    let languages = languages();
    let body = csv_body(10_000);
    let expression = languages
        .create_expression("tokenize", "\n", &options(&[(9, 100i64.into()), (10, true.into())]))
        .expect("tokenizer");

    c.bench_function("grouped_split_100", |b| {
        b.iter(|| black_box(drain(expression.as_ref(), black_box(&body))))
    });
}

criterion_group!(
    benches,
    benchmark_plain_split,
    benchmark_regex_split,
    benchmark_xml_split,
    benchmark_grouped_split
);
criterion_main!(benches);
