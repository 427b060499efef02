// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Operator and keyword spellings shared by both renderers

use ecsql_ir::{
    BinaryValueOperator, BooleanOperator, CompoundOperator, FrameBound, FrameUnits, JoinDirection,
    JoinKind, SetQuantifier, SortDirection, UnaryValueOperator,
};

/// Fixed text of an operator or keyword
pub trait Keyword {
    /// Text as written in a statement. Empty for "not specified" variants.
    fn keyword(&self) -> &'static str;
}

impl Keyword for BooleanOperator {
    fn keyword(&self) -> &'static str {
        match self {
            BooleanOperator::And => "AND",
            BooleanOperator::Or => "OR",
            BooleanOperator::Eq => "=",
            BooleanOperator::NotEq => "<>",
            BooleanOperator::Lt => "<",
            BooleanOperator::LtEq => "<=",
            BooleanOperator::Gt => ">",
            BooleanOperator::GtEq => ">=",
            BooleanOperator::Is => "IS",
            BooleanOperator::IsNot => "IS NOT",
            BooleanOperator::In => "IN",
            BooleanOperator::NotIn => "NOT IN",
            BooleanOperator::Like => "LIKE",
            BooleanOperator::NotLike => "NOT LIKE",
            BooleanOperator::Between => "BETWEEN",
            BooleanOperator::NotBetween => "NOT BETWEEN",
        }
    }
}

impl Keyword for BinaryValueOperator {
    fn keyword(&self) -> &'static str {
        match self {
            BinaryValueOperator::Plus => "+",
            BinaryValueOperator::Minus => "-",
            BinaryValueOperator::Multiply => "*",
            BinaryValueOperator::Divide => "/",
            BinaryValueOperator::Modulo => "%",
            BinaryValueOperator::Concat => "||",
            BinaryValueOperator::BitwiseAnd => "&",
            BinaryValueOperator::BitwiseOr => "|",
            BinaryValueOperator::ShiftLeft => "<<",
            BinaryValueOperator::ShiftRight => ">>",
        }
    }
}

impl Keyword for UnaryValueOperator {
    fn keyword(&self) -> &'static str {
        match self {
            UnaryValueOperator::Minus => "-",
            UnaryValueOperator::Plus => "+",
            UnaryValueOperator::BitwiseNot => "~",
        }
    }
}

impl Keyword for JoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

impl Keyword for JoinDirection {
    fn keyword(&self) -> &'static str {
        match self {
            JoinDirection::Implied => "",
            JoinDirection::Forward => "FORWARD",
            JoinDirection::Backward => "BACKWARD",
        }
    }
}

impl Keyword for SetQuantifier {
    fn keyword(&self) -> &'static str {
        match self {
            SetQuantifier::NotSpecified => "",
            SetQuantifier::All => "ALL",
            SetQuantifier::Distinct => "DISTINCT",
        }
    }
}

impl Keyword for CompoundOperator {
    fn keyword(&self) -> &'static str {
        match self {
            CompoundOperator::Union => "UNION",
            CompoundOperator::Intersect => "INTERSECT",
            CompoundOperator::Except => "EXCEPT",
        }
    }
}

impl Keyword for SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::NotSpecified => "",
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl Keyword for FrameUnits {
    fn keyword(&self) -> &'static str {
        match self {
            FrameUnits::Rows => "ROWS",
            FrameUnits::Range => "RANGE",
            FrameUnits::Groups => "GROUPS",
        }
    }
}

impl Keyword for FrameBound {
    fn keyword(&self) -> &'static str {
        match self {
            FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING",
            FrameBound::Preceding => "PRECEDING",
            FrameBound::CurrentRow => "CURRENT ROW",
            FrameBound::Following => "FOLLOWING",
            FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING",
        }
    }
}

/// Append `keyword` preceded by a space, skipping empty keywords
pub(crate) fn push_keyword(out: &mut String, keyword: &impl Keyword) {
    let text = keyword.keyword();
    if !text.is_empty() {
        out.push(' ');
        out.push_str(text);
    }
}

/// Single-quoted string literal with embedded quotes doubled
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Bracket-quoted native identifier
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_keywords() {
        assert_eq!(BooleanOperator::NotIn.keyword(), "NOT IN");
        assert_eq!(BooleanOperator::IsNot.keyword(), "IS NOT");
        assert_eq!(BinaryValueOperator::Concat.keyword(), "||");
        assert_eq!(JoinKind::LeftOuter.keyword(), "LEFT OUTER JOIN");
    }

    #[test]
    fn test_push_keyword_skips_unspecified() {
        let mut out = String::from("SELECT");
        push_keyword(&mut out, &SetQuantifier::NotSpecified);
        assert_eq!(out, "SELECT");
        push_keyword(&mut out, &SetQuantifier::Distinct);
        assert_eq!(out, "SELECT DISTINCT");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_string("it's"), "'it''s'");
        assert_eq!(quote_identifier("ecsql_PSA"), "[ecsql_PSA]");
    }
}
