// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Operator type checks
//!
//! Rules for a binary boolean operator, applied in order:
//!
//! 1. An operand containing a struct array is rejected.
//! 2. A parameter on either side accepts everything else.
//! 3. The operand types must be comparable.
//! 4. Navigation, spatial, struct and primitive-array operands only take the
//!    equality family (`=`, `<>`, `IN`, `NOT IN`, `IS`, `IS NOT`).
//!
//! Assignments in UPDATE only apply rules 2 and 3.

use crate::error::{SemanticError, SemanticResult};
use ecsql_ir::{BooleanOperator, Exp, ExpTree, NodeId, TypeInfo};

/// A checked operand
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A parameter whose type is inferred from the other side
    Parameter,
    Typed(&'a TypeInfo),
}

impl<'a> Operand<'a> {
    /// The operand a node presents to the checker. Only parameters may be
    /// untyped here.
    pub fn of(tree: &'a ExpTree, node: NodeId) -> SemanticResult<Self> {
        match (tree.kind(node), tree.type_info(node)) {
            (Exp::Parameter(_), _) => Ok(Operand::Parameter),
            (_, Some(type_info)) => Ok(Operand::Typed(type_info)),
            (kind, None) => Err(SemanticError::UntypedOperand(
                ecsql_codegen::render_ecsql(tree, node).unwrap_or_else(|_| kind.kind_name().to_string()),
            )),
        }
    }

    fn type_info(self) -> Option<&'a TypeInfo> {
        match self {
            Operand::Parameter => None,
            Operand::Typed(t) => Some(t),
        }
    }
}

/// Check one operator application
pub fn check_operator(op: BooleanOperator, left: Operand<'_>, right: Operand<'_>) -> SemanticResult<()> {
    for side in [left, right].into_iter().filter_map(Operand::type_info) {
        if side.contains_struct_array() {
            return Err(SemanticError::UnsupportedOperandType(side.to_string()));
        }
    }
    let (Operand::Typed(l), Operand::Typed(r)) = (left, right) else {
        return Ok(());
    };
    if !l.can_compare(r) {
        return Err(SemanticError::TypeMismatch {
            left: l.to_string(),
            right: r.to_string(),
        });
    }
    if !op.is_equality_family() {
        if let Some(restricted) = [l, r].into_iter().find(|t| t.is_equality_only()) {
            return Err(SemanticError::UnsupportedOperatorForType {
                operator: format!("{op:?}"),
                type_name: restricted.to_string(),
            });
        }
    }
    Ok(())
}

/// Check `target = value` of an UPDATE
pub fn check_assignment(target: &TypeInfo, value: Operand<'_>) -> SemanticResult<()> {
    match value {
        Operand::Parameter => Ok(()),
        Operand::Typed(v) if target.can_compare(v) => Ok(()),
        Operand::Typed(v) => Err(SemanticError::TypeMismatch {
            left: target.to_string(),
            right: v.to_string(),
        }),
    }
}

/// Check a comparison node, fanning out over list, range and pattern operands
pub fn check_comparison(tree: &ExpTree, comparison: NodeId) -> SemanticResult<()> {
    let Exp::BinaryBoolean(op) = *tree.kind(comparison) else {
        return Ok(());
    };
    if !op.is_comparison() {
        return Ok(());
    }
    let (Some(lhs), Some(rhs)) = (tree.child(comparison, 0), tree.child(comparison, 1)) else {
        return Ok(());
    };
    let left = Operand::of(tree, lhs)?;

    let operands: Vec<NodeId> = match tree.kind(rhs) {
        Exp::ValueList | Exp::BetweenRange => tree.children(rhs).to_vec(),
        Exp::LikeEscape => tree.child(rhs, 0).into_iter().collect(),
        _ => vec![rhs],
    };
    // BETWEEN bounds are ordered comparisons, IN items equality ones
    let applied = match op {
        BooleanOperator::Between | BooleanOperator::NotBetween => BooleanOperator::LtEq,
        other => other,
    };
    for operand in operands {
        check_operator(applied, left, Operand::of(tree, operand)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pstruct;
    use ecsql_ir::{Literal, PrimitiveType};

    #[test]
    fn test_navigation_takes_equality_family_only() {
        let nav = TypeInfo::navigation("ecsql.PSA");
        let typed = Operand::Typed(&nav);
        for op in [
            BooleanOperator::Eq,
            BooleanOperator::NotEq,
            BooleanOperator::In,
            BooleanOperator::IsNot,
        ] {
            assert!(check_operator(op, typed, typed).is_ok(), "{op:?}");
        }
        let err = check_operator(BooleanOperator::Lt, typed, typed).unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperatorForType");
    }

    #[test]
    fn test_struct_arrays_are_rejected_even_against_parameters() {
        let array = TypeInfo::StructArray(pstruct());
        let err = check_operator(BooleanOperator::Eq, Operand::Typed(&array), Operand::Parameter)
            .unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperandType");

        let nested = TypeInfo::Struct(
            ecsql_ir::StructType::new("Outer").with_member("inner", array.clone()),
        );
        assert!(check_operator(BooleanOperator::Eq, Operand::Typed(&nested), Operand::Typed(&nested)).is_err());
    }

    #[test]
    fn test_parameter_skips_remaining_rules() {
        let point = TypeInfo::primitive(PrimitiveType::Point2d);
        assert!(check_operator(BooleanOperator::Gt, Operand::Typed(&point), Operand::Parameter).is_ok());
    }

    #[test]
    fn test_incomparable_operands() {
        let point = TypeInfo::primitive(PrimitiveType::Point2d);
        let long = TypeInfo::long();
        let err = check_operator(BooleanOperator::Eq, Operand::Typed(&point), Operand::Typed(&long))
            .unwrap_err();
        assert_eq!(err.code(), "TypeMismatch");
        assert!(check_operator(BooleanOperator::Eq, Operand::Typed(&TypeInfo::Null), Operand::Typed(&point)).is_ok());
    }

    #[test]
    fn test_assignment_ignores_operator_family() {
        let nav = TypeInfo::navigation("ecsql.P");
        assert!(check_assignment(&nav, Operand::Typed(&TypeInfo::navigation("ecsql.P"))).is_ok());
        assert!(check_assignment(&TypeInfo::long(), Operand::Typed(&TypeInfo::string())).is_ok());
        assert!(check_assignment(&TypeInfo::long(), Operand::Typed(&nav)).is_err());
    }

    #[test]
    fn test_only_parameters_may_be_untyped() {
        let mut tree = ExpTree::new();
        let param = tree.parameter(None);
        assert!(matches!(Operand::of(&tree, param), Ok(Operand::Parameter)));

        let lhs = tree.literal(Literal::Long(1));
        tree.set_type(lhs, TypeInfo::long()).unwrap();
        let untyped = tree.literal(Literal::Long(2));
        let err = Operand::of(&tree, untyped).unwrap_err();
        assert_eq!(err.code(), "UntypedOperand");
        assert_eq!(err.category(), crate::IssueCategory::Internal);

        let cmp = tree.boolean(lhs, BooleanOperator::Lt, untyped);
        assert_eq!(check_comparison(&tree, cmp).unwrap_err().code(), "UntypedOperand");
        assert!(check_assignment(&TypeInfo::long(), Operand::Parameter).is_ok());
    }

    #[test]
    fn test_check_comparison_over_value_list() {
        let mut tree = ExpTree::new();
        let lhs = tree.literal(Literal::Long(1));
        tree.set_type(lhs, TypeInfo::long()).unwrap();
        let ok = tree.literal(Literal::Long(2));
        tree.set_type(ok, TypeInfo::long()).unwrap();
        let param = tree.parameter(None);
        let cmp = tree.in_list(lhs, vec![ok, param], false);
        assert!(check_comparison(&tree, cmp).is_ok());

        let mut tree = ExpTree::new();
        let lhs = tree.literal(Literal::Long(1));
        tree.set_type(lhs, TypeInfo::long()).unwrap();
        let low = tree.literal(Literal::String("x".into()));
        tree.set_type(low, TypeInfo::primitive(PrimitiveType::Point2d)).unwrap();
        let high = tree.parameter(None);
        let cmp = tree.between(lhs, low, high, false);
        assert_eq!(check_comparison(&tree, cmp).unwrap_err().code(), "TypeMismatch");
    }
}
