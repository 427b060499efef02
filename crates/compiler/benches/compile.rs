// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Compilation benchmarks
//!
//! Measures end-to-end compilation of representative statements against the
//! standard test schema.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ecsql_ir::{BooleanOperator, ExpTree, JoinDirection, SelectClauses};
use ecsql_test_utils::{TreeBuilder, simple_select, standard_compiler};

fn filtered_select() -> ExpTree {
    let mut b = TreeBuilder::new();
    let items = b.items(&["I", "S", "P2D"]);
    let from = b.class("ecsql.PSA");
    let first = b.parameter(None);
    let lhs = b.compare("I", BooleanOperator::Gt, first);
    let second = b.parameter(Some("s"));
    let rhs = b.compare("S", BooleanOperator::Eq, second);
    let predicate = b.boolean(lhs, BooleanOperator::And, rhs);
    b.finish_select(SelectClauses::new(items, vec![from]).with_where(predicate))
}

fn relationship_join() -> ExpTree {
    let mut b = TreeBuilder::new();
    let items = b.items(&["a.I", "b.S"]);
    let from = b.class("ecsql.PSA a");
    let to = b.class("ecsql.PSA b");
    let link = b.class("ecsql.PSAHasPSA");
    let join = b.relationship_join(from, to, link, JoinDirection::Forward);
    b.finish_select(SelectClauses::new(items, vec![join]))
}

fn bench_compile(c: &mut Criterion) {
    let compiler = standard_compiler();
    let statements = [
        ("simple_select", simple_select(&["I", "S"], "ecsql.P")),
        ("wildcard", simple_select(&["*"], "ecsql.PSA")),
        ("filtered_select", filtered_select()),
        ("relationship_join", relationship_join()),
    ];

    let mut group = c.benchmark_group("compile");
    for (name, tree) in &statements {
        group.bench_with_input(BenchmarkId::from_parameter(name), tree, |b, tree| {
            b.iter_batched(
                || tree.clone(),
                |tree| black_box(compiler.compile(tree)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_compile
);

criterion_main!(benches);
