// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for compilation

use ecsql_codegen::{CodegenError, render_ecsql};
use ecsql_ir::{ExpTree, NodeId};
use ecsql_semantic::{Diagnostics, Issue, IssueCategory};
use serde::Serialize;

/// Result type alias for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// A failed compilation
///
/// Compilation is atomic: on failure no SQL is produced and the diagnostics
/// hold at least one error issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("ECSQL compilation failed: {diagnostics}")]
pub struct CompileError {
    pub diagnostics: Diagnostics,
}

impl CompileError {
    /// Report a rendering failure
    pub(crate) fn codegen(err: &CodegenError, expression: Option<String>) -> Self {
        let mut issue = Issue::error(IssueCategory::Codegen, codegen_code(err), err.to_string());
        if let Some(text) = expression {
            issue = issue.with_expression(text);
        }
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(issue);
        Self { diagnostics }
    }

    /// Report a rendering failure of the statement rooted at `root`
    pub(crate) fn codegen_at(tree: &ExpTree, root: NodeId, err: &CodegenError) -> Self {
        Self::codegen(err, render_ecsql(tree, root).ok())
    }

    /// Code of the first error issue
    pub fn code(&self) -> Option<&str> {
        self.diagnostics.first_error().map(|i| i.code.as_str())
    }
}

impl From<Diagnostics> for CompileError {
    fn from(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

fn codegen_code(err: &CodegenError) -> &'static str {
    match err {
        CodegenError::MissingRoot => "MissingRoot",
        CodegenError::NotFinalized { .. } => "NotFinalized",
        CodegenError::UnresolvedProperty(_) => "UnresolvedProperty",
        CodegenError::UnresolvedClass(_) => "UnresolvedClass",
        CodegenError::MissingAlias(_) => "MissingAlias",
        CodegenError::MissingParameter(_) => "MissingParameter",
        CodegenError::ColumnCountMismatch { .. } => "ColumnCountMismatch",
        CodegenError::UnexpectedNode { .. } => "UnexpectedNode",
    }
}
