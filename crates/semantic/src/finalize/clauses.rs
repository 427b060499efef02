// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Clause shape rules, checked once a clause's children are finalized.
//! Failures name the offending node.

use crate::context::ResolutionContext;
use crate::error::SemanticError;
use ecsql_function_registry::FunctionType;
use ecsql_ir::{Exp, ExpTree, NodeId, TypeInfo};

type ClauseResult = Result<(), (NodeId, SemanticError)>;

/// Text of a node for error messages
fn describe(tree: &ExpTree, node: NodeId) -> String {
    ecsql_codegen::render_ecsql(tree, node).unwrap_or_else(|_| tree.kind(node).kind_name().to_string())
}

/// Parameters and open types pass every operand rule
fn is_unchecked(tree: &ExpTree, node: NodeId) -> bool {
    tree.kind(node).is_parameter() || tree.type_info(node).is_none_or(TypeInfo::is_open)
}

/// A key is constant when no property is referenced outside its subqueries
fn is_constant(tree: &ExpTree, key: NodeId) -> bool {
    let mut pending = vec![key];
    while let Some(node) = pending.pop() {
        match tree.kind(node) {
            Exp::PropertyName(_) => return false,
            Exp::Subquery | Exp::Exists => {}
            _ => pending.extend_from_slice(tree.children(node)),
        }
    }
    true
}

/// GROUP BY keys may not be parameters, constants or navigation values
pub(super) fn check_group_by(tree: &ExpTree, id: NodeId) -> ClauseResult {
    for &key in tree.children(id) {
        let invalid = is_constant(tree, key) || tree.type_info(key).is_some_and(TypeInfo::is_navigation);
        if invalid {
            return Err((key, SemanticError::InvalidGroupByOperand(describe(tree, key))));
        }
    }
    Ok(())
}

/// HAVING requires a GROUP BY in the same SELECT
pub(super) fn check_having(tree: &ExpTree, id: NodeId) -> ClauseResult {
    let grouped = tree
        .parent(id)
        .and_then(|select| tree.find_child(select, |k| matches!(k, Exp::GroupBy)))
        .is_some();
    if grouped {
        Ok(())
    } else {
        Err((id, SemanticError::HavingWithoutGroupBy(describe(tree, id))))
    }
}

/// ORDER BY keys must be scalar primitives other than points and geometries
pub(super) fn check_order_by(tree: &ExpTree, id: NodeId) -> ClauseResult {
    for &spec in tree.children(id) {
        let Some(key) = tree.child(spec, 0) else {
            continue;
        };
        if is_unchecked(tree, key) {
            continue;
        }
        let orderable = tree
            .type_info(key)
            .and_then(TypeInfo::as_primitive)
            .is_some_and(|kind| !kind.is_spatial());
        if !orderable {
            return Err((key, SemanticError::InvalidOrderByOperand(describe(tree, key))));
        }
    }
    Ok(())
}

pub(super) fn check_limit_offset(tree: &ExpTree, id: NodeId) -> ClauseResult {
    for &operand in tree.children(id) {
        if !is_unchecked(tree, operand) && !tree.type_info(operand).is_some_and(TypeInfo::is_numeric) {
            return Err((
                operand,
                SemanticError::InvalidLimitOffsetOperand(describe(tree, operand)),
            ));
        }
    }
    Ok(())
}

/// `n PRECEDING` and `n FOLLOWING` offsets must be numeric
pub(super) fn check_window_frame(tree: &ExpTree, id: NodeId) -> ClauseResult {
    for &offset in tree.children(id) {
        if !is_unchecked(tree, offset) && !tree.type_info(offset).is_some_and(TypeInfo::is_numeric) {
            return Err((
                offset,
                SemanticError::InvalidWindowFunction(format!(
                    "frame offset {} is not numeric",
                    describe(tree, offset)
                )),
            ));
        }
    }
    Ok(())
}

/// `OVER` takes aggregate and window functions, and named windows must be
/// declared by the enclosing SELECT
pub(super) fn check_window_function(tree: &ExpTree, ctx: &ResolutionContext, id: NodeId) -> ClauseResult {
    let Some(call) = tree.child(id, 0) else {
        return Ok(());
    };
    if let Exp::FunctionCall(function) = tree.kind(call) {
        let scalar = ctx
            .functions()
            .get_function(&function.name)
            .is_some_and(|f| f.function_type == FunctionType::Scalar);
        if scalar {
            return Err((
                call,
                SemanticError::InvalidWindowFunction(format!(
                    "{} is not an aggregate or window function",
                    function.name
                )),
            ));
        }
    }

    let mut referenced = Vec::new();
    if let Exp::WindowFunction(window) = tree.kind(id) {
        referenced.extend(window.window_name.clone());
    }
    if let Some(spec) = tree.child(id, 1)
        && let Exp::WindowSpec { base: Some(base) } = tree.kind(spec)
    {
        referenced.push(base.clone());
    }
    for name in referenced {
        if !declared_windows(tree, id).iter().any(|w| w.eq_ignore_ascii_case(&name)) {
            return Err((
                id,
                SemanticError::InvalidWindowFunction(format!("window '{name}' is not defined")),
            ));
        }
    }
    Ok(())
}

/// Names declared by the WINDOW clause of the SELECT enclosing `node`
fn declared_windows(tree: &ExpTree, node: NodeId) -> Vec<String> {
    tree.find_ancestor(node, |k| matches!(k, Exp::SingleSelect(_)))
        .and_then(|select| tree.find_child(select, |k| matches!(k, Exp::WindowClause)))
        .map(|clause| {
            tree.children(clause)
                .iter()
                .filter_map(|&w| match tree.kind(w) {
                    Exp::NamedWindow { name } => Some(name.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ecsql_ir::{
        BinaryValueOperator, ClassNameRef, FunctionCall, Literal, PrimitiveType, SelectClauses,
        SortDirection, UnaryValueOperator,
    };

    fn typed(tree: &mut ExpTree, literal: Literal) -> NodeId {
        let node = tree.literal(literal.clone());
        tree.set_type(node, literal.type_info()).unwrap();
        node
    }

    #[test]
    fn test_group_by_rejects_constants_and_parameters() {
        let mut tree = ExpTree::new();
        let constant = typed(&mut tree, Literal::Long(1));
        let group = tree.add(Exp::GroupBy, [constant]);
        assert_eq!(check_group_by(&tree, group).unwrap_err().0, constant);

        let param = tree.parameter(None);
        let group = tree.add(Exp::GroupBy, [param]);
        assert!(check_group_by(&tree, group).is_err());

        let nav = tree.property("Parent");
        tree.set_type(nav, TypeInfo::navigation("ecsql.PSA")).unwrap();
        let group = tree.add(Exp::GroupBy, [nav]);
        assert!(check_group_by(&tree, group).is_err());
    }

    #[test]
    fn test_group_by_rejects_constant_expressions() {
        let mut tree = ExpTree::new();
        let one = typed(&mut tree, Literal::Long(1));
        let negated = tree.unary(UnaryValueOperator::Minus, one);
        let group = tree.add(Exp::GroupBy, [negated]);
        let (node, err) = check_group_by(&tree, group).unwrap_err();
        assert_eq!(node, negated);
        assert_eq!(err.code(), "InvalidGroupByOperand");

        let lhs = typed(&mut tree, Literal::Long(1));
        let rhs = typed(&mut tree, Literal::Long(1));
        let sum = tree.binary(lhs, BinaryValueOperator::Plus, rhs);
        let sum = tree.parenthesize(sum);
        let group = tree.add(Exp::GroupBy, [sum]);
        assert!(check_group_by(&tree, group).is_err());

        let property = tree.property("I");
        tree.set_type(property, TypeInfo::primitive(PrimitiveType::Integer)).unwrap();
        let offset = typed(&mut tree, Literal::Long(1));
        let shifted = tree.binary(property, BinaryValueOperator::Plus, offset);
        tree.set_type(shifted, TypeInfo::long()).unwrap();
        let group = tree.add(Exp::GroupBy, [shifted]);
        assert!(check_group_by(&tree, group).is_ok());
    }

    #[test]
    fn test_order_by_rejects_points() {
        let mut tree = ExpTree::new();
        let point = tree.property("P2D");
        tree.set_type(point, TypeInfo::primitive(PrimitiveType::Point2d)).unwrap();
        let param = tree.parameter(None);
        let spec = tree.add(Exp::OrderBySpec(SortDirection::Ascending), [param]);
        let ok = tree.add(Exp::OrderBy, [spec]);
        assert!(check_order_by(&tree, ok).is_ok());

        let spec = tree.add(Exp::OrderBySpec(SortDirection::Ascending), [point]);
        let bad = tree.add(Exp::OrderBy, [spec]);
        let (node, err) = check_order_by(&tree, bad).unwrap_err();
        assert_eq!(node, point);
        assert_eq!(err.code(), "InvalidOrderByOperand");
    }

    #[test]
    fn test_limit_must_be_numeric() {
        let mut tree = ExpTree::new();
        let text = typed(&mut tree, Literal::String("10".into()));
        let limit = tree.add(Exp::LimitOffset, [text]);
        assert!(check_limit_offset(&tree, limit).is_err());

        let number = typed(&mut tree, Literal::Long(10));
        let param = tree.parameter(Some("offset"));
        let limit = tree.add(Exp::LimitOffset, [number, param]);
        assert!(check_limit_offset(&tree, limit).is_ok());
    }

    #[test]
    fn test_having_requires_group_by() {
        let mut tree = ExpTree::new();
        let item = tree.property("I");
        let item = tree.derived(item, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let inside = tree.property("S");
        let count = tree.function(FunctionCall::new("count"), vec![inside]);
        let single = tree.single_select(SelectClauses::new(vec![item], vec![from]).with_having(count));
        let having = tree.find_child(single, |k| matches!(k, Exp::Having)).unwrap();
        let (node, err) = check_having(&tree, having).unwrap_err();
        assert_eq!(node, having);
        assert_eq!(err.code(), "HavingWithoutGroupBy");

        let mut tree = ExpTree::new();
        let item = tree.property("I");
        let item = tree.derived(item, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let key = tree.property("I");
        let inside = tree.property("S");
        let count = tree.function(FunctionCall::new("count"), vec![inside]);
        let single = tree.single_select(
            SelectClauses::new(vec![item], vec![from])
                .with_group_by(vec![key])
                .with_having(count),
        );
        let having = tree.find_child(single, |k| matches!(k, Exp::Having)).unwrap();
        assert!(check_having(&tree, having).is_ok());
    }

    #[test]
    fn test_named_window_must_be_declared() {
        let ctx = testing::context();
        let mut tree = ExpTree::new();
        let call = tree.function(FunctionCall::new("row_number"), vec![]);
        let over = tree.window_function(call, Some("w"), None);
        let item = tree.derived(over, None);
        let spec = tree.window_spec(None, vec![], vec![], None);
        let single = tree.single_select(SelectClauses::new(vec![item], vec![]).with_window("W", spec));
        tree.select(single);
        assert!(check_window_function(&tree, &ctx, over).is_ok());

        let mut tree = ExpTree::new();
        let call = tree.function(FunctionCall::new("row_number"), vec![]);
        let over = tree.window_function(call, Some("w"), None);
        let item = tree.derived(over, None);
        tree.single_select(SelectClauses::new(vec![item], vec![]));
        assert!(check_window_function(&tree, &ctx, over).is_err());
    }

    #[test]
    fn test_scalar_function_cannot_take_over() {
        let ctx = testing::context();
        let mut tree = ExpTree::new();
        let call = tree.function(FunctionCall::new("upper"), vec![]);
        let spec = tree.window_spec(None, vec![], vec![], None);
        let over = tree.window_function(call, None, Some(spec));
        let (node, _) = check_window_function(&tree, &ctx, over).unwrap_err();
        assert_eq!(node, call);

        let call = tree.function(FunctionCall::new("sum"), vec![]);
        let spec = tree.window_spec(None, vec![], vec![], None);
        let over = tree.window_function(call, None, Some(spec));
        assert!(check_window_function(&tree, &ctx, over).is_ok());
    }
}
