// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! This module defines error types used throughout the semantic analysis layer.
//! Every error maps to a stable code and an [`IssueCategory`] so that hosts can
//! filter diagnostics without matching on message text.

use crate::diagnostics::IssueCategory;
use ecsql_catalog::CatalogError;
use ecsql_ir::TreeError;
use thiserror::Error;

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Errors that can occur during semantic analysis
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// Class not found in the repository or in an enclosing WITH clause
    #[error("Class not found: {0}")]
    UnknownClass(String),

    /// Unqualified class name present in several schemas
    #[error("Ambiguous class '{name}' (found in schemas {schemas:?})")]
    AmbiguousClass { name: String, schemas: Vec<String> },

    /// Property path matches nothing visible from the expression
    #[error("Property not found: {0}")]
    UnknownProperty(String),

    /// Property path matches more than one range class
    #[error("Ambiguous property reference: {path} (found in {candidates:?})")]
    AmbiguousProperty {
        path: String,
        candidates: Vec<String>,
    },

    /// Operand types are not comparable
    #[error("Type mismatch: {left} is not compatible with {right}")]
    TypeMismatch { left: String, right: String },

    /// Operator not allowed for an operand type
    #[error("Operator {operator} is not supported for type {type_name}")]
    UnsupportedOperatorForType { operator: String, type_name: String },

    /// Operand type not allowed in a predicate at all
    #[error("Type {0} cannot be used in a predicate")]
    UnsupportedOperandType(String),

    /// Class does not satisfy either end of a relationship
    #[error("Class '{class}' is not related through '{relationship}'")]
    NotRelated { class: String, relationship: String },

    /// More than one FROM entry qualifies for a relationship end
    #[error("Ambiguous end of relationship '{relationship}': {candidates:?}")]
    AmbiguousEnd {
        relationship: String,
        candidates: Vec<String>,
    },

    /// Self-relationship join without FORWARD or BACKWARD
    #[error("Relationship '{0}' joins a class to itself; specify FORWARD or BACKWARD")]
    MissingJoinDirection(String),

    /// Explicit direction contradicts the constraint membership of the joined class
    #[error("Direction {direction} of relationship '{relationship}' does not match class '{class}'")]
    InvalidJoinDirection {
        relationship: String,
        class: String,
        direction: String,
    },

    /// ORDER BY on a branch of a compound SELECT, or a computed compound sort key
    #[error("Invalid ORDER BY in compound SELECT: {0}")]
    InvalidOrderByForCompoundQuery(String),

    /// GROUP BY key that is a parameter, a constant or a navigation value
    #[error("Invalid GROUP BY expression: {0}")]
    InvalidGroupByOperand(String),

    /// ORDER BY key that is not a primitive or is a point/geometry
    #[error("Invalid ORDER BY expression: {0}")]
    InvalidOrderByOperand(String),

    /// LIMIT or OFFSET that is not numeric
    #[error("LIMIT and OFFSET must be numeric: {0}")]
    InvalidLimitOffsetOperand(String),

    /// Two FROM entries share a name
    #[error("Duplicate range alias: {0}")]
    DuplicateRangeAlias(String),

    /// Compound branches select a different number of columns
    #[error("Set operation column count mismatch: left has {left} columns, right has {right} columns")]
    SetOperationColumnCountMismatch { left: usize, right: usize },

    /// CTE column count mismatch
    #[error("CTE '{cte}' defines {defined} columns but query returns {returned} columns")]
    CteColumnCountMismatch {
        cte: String,
        defined: usize,
        returned: usize,
    },

    /// HAVING in a SELECT without GROUP BY
    #[error("A GROUP BY clause is mandatory before HAVING: {0}")]
    HavingWithoutGroupBy(String),

    /// Misused window function, unknown named window, or bad frame offset
    #[error("Invalid window function: {0}")]
    InvalidWindowFunction(String),

    /// UPDATE/INSERT target that cannot be assigned
    #[error("Invalid assignment target: {0}")]
    InvalidAssignmentTarget(String),

    /// INSERT property and value lists differ in length
    #[error("INSERT lists {properties} properties but {values} values")]
    ValueCountMismatch { properties: usize, values: usize },

    /// Subquery in value position that does not return exactly one column
    #[error("Subquery must return exactly one column, it returns {0}")]
    InvalidSubquery(usize),

    /// Statement nests deeper than the configured limit
    #[error("Statement nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),

    /// Tree was finalized by an earlier analysis
    #[error("Statement has already been analyzed")]
    AlreadyFinalized,

    /// Repository failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Write-once slot of the tree written twice
    #[error("Expression tree error: {0}")]
    Tree(#[from] TreeError),

    /// Operand reached a type check without a type
    #[error("Expression has no type: {0}")]
    UntypedOperand(String),
}

impl SemanticError {
    /// Stable identifier of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::UnknownClass(_) => "UnknownClass",
            SemanticError::AmbiguousClass { .. } => "AmbiguousClass",
            SemanticError::UnknownProperty(_) => "UnknownProperty",
            SemanticError::AmbiguousProperty { .. } => "AmbiguousProperty",
            SemanticError::TypeMismatch { .. } => "TypeMismatch",
            SemanticError::UnsupportedOperatorForType { .. } => "UnsupportedOperatorForType",
            SemanticError::UnsupportedOperandType(_) => "UnsupportedOperandType",
            SemanticError::NotRelated { .. } => "NotRelated",
            SemanticError::AmbiguousEnd { .. } => "AmbiguousEnd",
            SemanticError::MissingJoinDirection(_) => "MissingJoinDirection",
            SemanticError::InvalidJoinDirection { .. } => "InvalidJoinDirection",
            SemanticError::InvalidOrderByForCompoundQuery(_) => "InvalidOrderByForCompoundQuery",
            SemanticError::InvalidGroupByOperand(_) => "InvalidGroupByOperand",
            SemanticError::InvalidOrderByOperand(_) => "InvalidOrderByOperand",
            SemanticError::InvalidLimitOffsetOperand(_) => "InvalidLimitOffsetOperand",
            SemanticError::DuplicateRangeAlias(_) => "DuplicateRangeAlias",
            SemanticError::SetOperationColumnCountMismatch { .. } => {
                "SetOperationColumnCountMismatch"
            }
            SemanticError::CteColumnCountMismatch { .. } => "CteColumnCountMismatch",
            SemanticError::HavingWithoutGroupBy(_) => "HavingWithoutGroupBy",
            SemanticError::InvalidWindowFunction(_) => "InvalidWindowFunction",
            SemanticError::InvalidAssignmentTarget(_) => "InvalidAssignmentTarget",
            SemanticError::ValueCountMismatch { .. } => "ValueCountMismatch",
            SemanticError::InvalidSubquery(_) => "InvalidSubquery",
            SemanticError::NestingTooDeep(_) => "NestingTooDeep",
            SemanticError::AlreadyFinalized => "AlreadyFinalized",
            SemanticError::Catalog(_) => "Catalog",
            SemanticError::Tree(_) => "Tree",
            SemanticError::UntypedOperand(_) => "UntypedOperand",
        }
    }

    pub fn category(&self) -> IssueCategory {
        match self {
            SemanticError::UnknownClass(_)
            | SemanticError::AmbiguousClass { .. }
            | SemanticError::UnknownProperty(_)
            | SemanticError::AmbiguousProperty { .. }
            | SemanticError::DuplicateRangeAlias(_) => IssueCategory::NameResolution,
            SemanticError::TypeMismatch { .. }
            | SemanticError::UnsupportedOperatorForType { .. }
            | SemanticError::UnsupportedOperandType(_) => IssueCategory::TypeSystem,
            SemanticError::NotRelated { .. }
            | SemanticError::AmbiguousEnd { .. }
            | SemanticError::MissingJoinDirection(_)
            | SemanticError::InvalidJoinDirection { .. } => IssueCategory::RelationshipJoin,
            SemanticError::InvalidOrderByForCompoundQuery(_)
            | SemanticError::InvalidGroupByOperand(_)
            | SemanticError::InvalidOrderByOperand(_)
            | SemanticError::InvalidLimitOffsetOperand(_)
            | SemanticError::SetOperationColumnCountMismatch { .. }
            | SemanticError::CteColumnCountMismatch { .. }
            | SemanticError::HavingWithoutGroupBy(_)
            | SemanticError::InvalidWindowFunction(_)
            | SemanticError::InvalidAssignmentTarget(_)
            | SemanticError::ValueCountMismatch { .. }
            | SemanticError::InvalidSubquery(_) => IssueCategory::ClauseShape,
            SemanticError::NestingTooDeep(_) | SemanticError::AlreadyFinalized => {
                IssueCategory::Limits
            }
            SemanticError::Catalog(_) => IssueCategory::Repository,
            SemanticError::Tree(_) | SemanticError::UntypedOperand(_) => IssueCategory::Internal,
        }
    }

    /// Map repository lookup failures onto the name-resolution taxonomy
    pub(crate) fn from_class_lookup(err: CatalogError) -> Self {
        match err {
            CatalogError::ClassNotFound { schema, name } => {
                let qualified = match schema {
                    Some(schema) => format!("{schema}.{name}"),
                    None => name,
                };
                SemanticError::UnknownClass(qualified)
            }
            CatalogError::AmbiguousClass { name, schemas } => {
                SemanticError::AmbiguousClass { name, schemas }
            }
            other => SemanticError::Catalog(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_property() {
        let err = SemanticError::UnknownProperty("a.Foo".to_string());
        assert_eq!(format!("{}", err), "Property not found: a.Foo");
    }

    #[test]
    fn test_error_display_ambiguous_property() {
        let err = SemanticError::AmbiguousProperty {
            path: "I".to_string(),
            candidates: vec!["PSA".to_string(), "P".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Ambiguous property reference"));
        assert!(msg.contains("PSA"));
    }

    #[test]
    fn test_error_display_cte_column_count() {
        let err = SemanticError::CteColumnCountMismatch {
            cte: "cte".to_string(),
            defined: 2,
            returned: 3,
        };
        assert_eq!(
            format!("{}", err),
            "CTE 'cte' defines 2 columns but query returns 3 columns"
        );
    }

    #[test]
    fn test_codes_and_categories() {
        let err = SemanticError::MissingJoinDirection("ecsql.PSAHasPSA".into());
        assert_eq!(err.code(), "MissingJoinDirection");
        assert_eq!(err.category(), IssueCategory::RelationshipJoin);

        let err = SemanticError::InvalidGroupByOperand("?".into());
        assert_eq!(err.category(), IssueCategory::ClauseShape);
    }

    #[test]
    fn test_class_lookup_mapping() {
        let err = SemanticError::from_class_lookup(CatalogError::ClassNotFound {
            schema: Some("ecsql".into()),
            name: "Nope".into(),
        });
        assert_eq!(err, SemanticError::UnknownClass("ecsql.Nope".into()));

        let err = SemanticError::from_class_lookup(CatalogError::NotARelationship("x".into()));
        assert_eq!(err.code(), "Catalog");
    }
}
