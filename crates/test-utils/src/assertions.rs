// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Compile-and-check assertions

use ecsql_compiler::{CompileError, CompiledStatement, EcsqlCompiler};
use ecsql_ir::{Exp, ExpTree, NodeId, TypeInfo};

/// Compile a statement, panicking with its diagnostics on failure
#[track_caller]
pub fn assert_compiles(compiler: &EcsqlCompiler, tree: ExpTree) -> CompiledStatement {
    match compiler.compile(tree) {
        Ok(compiled) => compiled,
        Err(err) => panic!("expected statement to compile, got:\n{}", err.diagnostics),
    }
}

/// Compile a statement that must fail with the given issue code
#[track_caller]
pub fn assert_fails_with(compiler: &EcsqlCompiler, tree: ExpTree, code: &str) -> CompileError {
    match compiler.compile(tree) {
        Ok(compiled) => panic!(
            "expected {code}, but the statement compiled to: {}",
            compiled.native_sql
        ),
        Err(err) => {
            assert_eq!(
                err.code(),
                Some(code),
                "unexpected diagnostics:\n{}",
                err.diagnostics
            );
            err
        }
    }
}

/// Compile a statement and compare its native SQL
#[track_caller]
pub fn assert_native_sql(compiler: &EcsqlCompiler, tree: ExpTree, expected: &str) -> CompiledStatement {
    let compiled = assert_compiles(compiler, tree);
    assert_eq!(compiled.native_sql, expected);
    compiled
}

/// Types of the compiled parameters, in index order
pub fn parameter_types(compiled: &CompiledStatement) -> Vec<TypeInfo> {
    compiled
        .parameters
        .iter()
        .map(|p| p.type_info.clone())
        .collect()
}

/// Property paths of the SELECT list of the first branch, as written
pub fn selection_paths(tree: &ExpTree) -> Vec<String> {
    let Some(selection) = first_selection(tree) else {
        return Vec::new();
    };
    tree.children(selection)
        .iter()
        .filter_map(|&derived| tree.child(derived, 0))
        .filter_map(|value| tree.kind(value).as_property_name())
        .map(|p| p.path.to_string())
        .collect()
}

fn first_selection(tree: &ExpTree) -> Option<NodeId> {
    let root = tree.root()?;
    tree.descendants(root)
        .into_iter()
        .find(|&id| matches!(tree.kind(id), Exp::Selection))
}
