use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use monkey_parser::parser::Parser;

fn parse(source: &str) {
    let mut parser = Parser::new(source);
    let _ast = parser.parse_program();
    assert!(parser.errors().is_empty());
}

fn bench_parse(c: &mut Criterion, name: &str, source: &str) {
    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function(name, |b| b.iter(|| parse(source)));
    group.finish();
}

/// A single expression of 100 nested function literals, each capturing
/// every parameter above it: `fn(x0) { fn(x1) { ... x0 + x1 + ... } }`.
fn nested_closures(c: &mut Criterion) {
    let depth = 100;
    let mut source = String::from("let chain = ");
    for i in 0..depth {
        source.push_str(&format!("fn(x{i}) {{ "));
    }
    source.push_str("x0");
    for i in 1..depth {
        source.push_str(&format!(" + x{i}"));
    }
    for _i in 0..depth {
        source.push_str(" }");
    }
    source.push(';');

    bench_parse(c, "nested-closures", &source);
}

/// One large hash literal whose values are array literals with computed
/// elements, followed by a chain of index expressions into it.
fn collection_literals(c: &mut Criterion) {
    let mut source = String::from("let store = {");
    for i in 0..200 {
        if i > 0 {
            source.push_str(", ");
        }
        source.push_str(&format!(r#""key{i}": [{i}, {i} * 2, {i} - 1]"#));
    }
    source.push_str("};");
    for i in 0..200 {
        source.push_str(&format!(r#" store["key{i}"][2];"#));
    }

    bench_parse(c, "collection-literals", &source);
}

/// Many small let-bound functions with conditional bodies and calls,
/// the shape a typical monkey program is dominated by.
fn function_definitions(c: &mut Criterion) {
    let mut source = String::new();
    for i in 0..100 {
        source.push_str(&format!(
            "let f{i} = fn(a, b) {{ if (a < b) {{ a + b }} else {{ a * b }} }};"
        ));
    }
    for i in 0..100 {
        source.push_str(&format!("f{i}({i}, {i} + 1);"));
    }

    bench_parse(c, "function-definitions", &source);
}

criterion_group!(
    benches,
    nested_closures,
    collection_literals,
    function_definitions
);
criterion_main!(benches);
