// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Value and boolean expression payloads
//!
//! The payloads carried by value-producing nodes of the expression tree
//! (see [`crate::tree::Exp`]):
//!
//! - **Property references**: `a.StructProp.Member`, resolved against range classes
//! - **Parameters**: positional `?` or named `:name`
//! - **Literals**: `NULL`, booleans, integers, doubles, strings, `DATE '...'`,
//!   `TIMESTAMP '...'`
//! - **Operators**: boolean (comparisons, `AND`/`OR`, `IN`, `LIKE`, `BETWEEN`),
//!   binary value (arithmetic, concatenation, bitwise) and unary value operators
//! - **Function calls** and `CAST`
//!
//! Operands are children of the node, never fields of the payload:
//!
//! ```text
//! BinaryBoolean(Eq)
//! ├── PropertyName("a.I")
//! └── Parameter(":i")
//! ```

use crate::path::{PropertyPath, ResolvedProperty};
use crate::query::SetQuantifier;
use crate::types::{PrimitiveType, TypeInfo};
use serde::{Deserialize, Serialize};

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    DateTime { kind: DateTimeKind, value: String },
}

/// Prefix of a datetime literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTimeKind {
    Date,
    Timestamp,
}

impl Literal {
    pub fn type_info(&self) -> TypeInfo {
        match self {
            Literal::Null => TypeInfo::Null,
            Literal::Boolean(_) => TypeInfo::boolean(),
            Literal::Long(_) => TypeInfo::long(),
            Literal::Double(_) => TypeInfo::double(),
            Literal::String(_) => TypeInfo::string(),
            Literal::DateTime { .. } => TypeInfo::primitive(PrimitiveType::DateTime),
        }
    }
}

/// Operators producing a boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,
    IsNot,
    In,
    NotIn,
    Like,
    NotLike,
    Between,
    NotBetween,
}

impl BooleanOperator {
    /// Everything except the logical connectives
    pub fn is_comparison(self) -> bool {
        !matches!(self, Self::And | Self::Or)
    }

    /// `=`, `<>`, `IN`, `NOT IN`, `IS`, `IS NOT`
    pub fn is_equality_family(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::In | Self::NotIn | Self::Is | Self::IsNot
        )
    }

    /// Operators whose negative form matches on any differing component
    pub fn is_negative(self) -> bool {
        matches!(self, Self::NotEq | Self::IsNot | Self::NotIn)
    }
}

/// Binary operators producing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryValueOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Concat,
    BitwiseAnd,
    BitwiseOr,
    ShiftLeft,
    ShiftRight,
}

impl BinaryValueOperator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Plus | Self::Minus | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::BitwiseAnd | Self::BitwiseOr | Self::ShiftLeft | Self::ShiftRight
        )
    }
}

/// Unary operators producing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryValueOperator {
    Minus,
    Plus,
    BitwiseNot,
}

/// A `?` or `:name` parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    /// 1-based position, assigned when the parameter is tracked
    pub index: Option<u32>,
}

/// A dotted property reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyName {
    /// The path as written
    pub path: PropertyPath,
    pub resolved: Option<ResolvedProperty>,
}

impl PropertyName {
    pub fn new(path: PropertyPath) -> Self {
        Self {
            path,
            resolved: None,
        }
    }
}

/// A function call. Arguments are the node's children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub quantifier: SetQuantifier,
    /// `COUNT(*)`
    pub star: bool,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantifier: SetQuantifier::NotSpecified,
            star: false,
        }
    }

    /// Builder method: `COUNT(*)` style argument
    pub fn with_star(mut self) -> Self {
        self.star = true;
        self
    }

    /// Builder method: `DISTINCT`/`ALL` argument quantifier
    pub fn with_quantifier(mut self, quantifier: SetQuantifier) -> Self {
        self.quantifier = quantifier;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_types() {
        assert_eq!(Literal::Null.type_info(), TypeInfo::Null);
        assert_eq!(Literal::Long(3).type_info(), TypeInfo::long());
        assert_eq!(
            Literal::DateTime {
                kind: DateTimeKind::Date,
                value: "2012-01-18".into()
            }
            .type_info(),
            TypeInfo::primitive(PrimitiveType::DateTime)
        );
    }

    #[test]
    fn test_operator_families() {
        assert!(BooleanOperator::In.is_equality_family());
        assert!(!BooleanOperator::Lt.is_equality_family());
        assert!(!BooleanOperator::And.is_comparison());
        assert!(BooleanOperator::Like.is_comparison());
        assert!(BinaryValueOperator::Modulo.is_arithmetic());
        assert!(BinaryValueOperator::ShiftLeft.is_bitwise());
    }
}
