// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Output of a successful compilation

use crate::options::StatementOptions;
use ecsql_ir::{ExpTree, TypeInfo};
use serde::Serialize;

/// Native binding of one ECSQL parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterBinding {
    /// 1-based ECSQL parameter index
    pub index: u32,
    pub name: Option<String>,
    pub type_info: TypeInfo,
    /// 1-based `?N` placeholders, one per native column of the type
    pub sql_indices: Vec<u32>,
}

/// A compiled ECSQL statement
///
/// Holds the analyzed tree, the native SQL for the backing engine and the
/// information the executor needs to bind values.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    /// Fully analyzed tree
    pub tree: ExpTree,
    pub native_sql: String,
    /// Canonical ECSQL, when enabled in the compile options
    pub ecsql: Option<String>,
    /// Bindings ordered by ECSQL index
    pub parameters: Vec<ParameterBinding>,
    pub options: StatementOptions,
}

impl CompiledStatement {
    /// Binding of the parameter with the given 1-based index
    pub fn parameter(&self, index: u32) -> Option<&ParameterBinding> {
        self.parameters.iter().find(|p| p.index == index)
    }

    /// Binding of a named parameter, matched ASCII case-insensitively
    pub fn named_parameter(&self, name: &str) -> Option<&ParameterBinding> {
        self.parameters.iter().find(|p| {
            p.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Number of `?N` placeholders in the native SQL
    pub fn native_parameter_count(&self) -> usize {
        self.parameters.iter().map(|p| p.sql_indices.len()).sum()
    }
}
