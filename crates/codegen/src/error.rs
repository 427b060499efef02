// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for rendering

use ecsql_ir::NodeId;
use serde::Serialize;

/// Result type alias for rendering operations
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors that can occur while rendering a tree
///
/// Native SQL is only produced from fully analyzed trees, so every variant
/// indicates a tree that skipped or failed analysis.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq, Serialize)]
pub enum CodegenError {
    /// The tree has no root node
    #[error("Expression tree has no root")]
    MissingRoot,

    /// Native rendering of a tree that has not been analyzed
    #[error("Node {node} ({kind}) has not been finalized")]
    NotFinalized { node: NodeId, kind: String },

    /// A property reference without resolution
    #[error("Property '{0}' is not resolved")]
    UnresolvedProperty(String),

    /// A class reference without resolution
    #[error("Class '{0}' is not resolved")]
    UnresolvedClass(String),

    /// A derived property referenced by alias has no alias
    #[error("Derived property {0} has no render alias")]
    MissingAlias(NodeId),

    /// A parameter without an index or without a placeholder slot
    #[error("Parameter {0} has no placeholder")]
    MissingParameter(String),

    /// Operands of a comparison with different native column counts
    #[error("Cannot compare {left} column(s) with {right} column(s) in {context}")]
    ColumnCountMismatch {
        left: usize,
        right: usize,
        context: String,
    },

    /// Node in a position the renderer cannot express
    #[error("Unexpected {found} in {context}")]
    UnexpectedNode { context: String, found: String },
}

impl CodegenError {
    pub(crate) fn unexpected(context: &str, found: &str) -> Self {
        CodegenError::UnexpectedNode {
            context: context.to_string(),
            found: found.to_string(),
        }
    }
}
