// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Property resolution and type assignment for value nodes

use super::fail;
use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use crate::resolution::{leading_selection, resolve_link, resolve_property};
use crate::typecheck::check_comparison;
use ecsql_function_registry::FunctionType;
use ecsql_ir::{
    BinaryValueOperator, Exp, ExpTree, NodeId, PrimitiveType, PropertyTarget, TypeInfo,
    UnaryValueOperator,
};

/// Resolve a `PropertyName` against the current scope and record the result
pub(super) fn resolve_property_name(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    id: NodeId,
) -> SemanticResult<()> {
    let Some(property) = tree.kind(id).as_property_name() else {
        return Ok(());
    };
    if property.resolved.is_some() {
        return Ok(());
    }
    if property.path.is_wildcard() {
        let path = property.path.to_string();
        return fail(tree, ctx, id, SemanticError::UnknownProperty(path));
    }

    let found = match resolve_property(tree, ctx, id) {
        Ok(found) => found,
        Err(err) => return fail(tree, ctx, id, err),
    };
    match found.resolved.target {
        PropertyTarget::Derived { derived } | PropertyTarget::CompoundColumn { derived, .. } => {
            resolve_link(tree, ctx, derived)?;
        }
        PropertyTarget::Class { .. } | PropertyTarget::SelectAlias { .. } => {}
    }

    if let Exp::PropertyName(property) = tree.kind_mut(id) {
        property.resolved = Some(found.resolved);
    }
    tree.set_type(id, found.type_info)?;
    Ok(())
}

/// Derive the type of a node from its finalized children
pub(super) fn assign_type(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    id: NodeId,
) -> SemanticResult<()> {
    let type_info = match tree.kind(id) {
        Exp::Literal(literal) => literal.type_info(),
        Exp::Cast(target) => TypeInfo::primitive(*target),
        Exp::Not | Exp::Exists => TypeInfo::boolean(),
        Exp::BinaryBoolean(_) => {
            if let Err(err) = check_comparison(tree, id) {
                return fail(tree, ctx, id, err);
            }
            TypeInfo::boolean()
        }
        Exp::ValueList | Exp::BetweenRange | Exp::LikeEscape => TypeInfo::Varies,
        Exp::DerivedProperty(_) | Exp::OrderBySpec(_) => child_type(tree, id, 0),
        Exp::BinaryValue(op) => binary_value_type(tree, id, *op),
        Exp::UnaryValue(op) => match op {
            UnaryValueOperator::BitwiseNot => TypeInfo::long(),
            UnaryValueOperator::Minus | UnaryValueOperator::Plus => match tree.child(id, 0) {
                Some(operand) if !tree.kind(operand).is_parameter() => child_type(tree, id, 0),
                _ => TypeInfo::double(),
            },
        },
        Exp::FunctionCall(call) => {
            let Some(function) = ctx.functions().get_function(&call.name) else {
                tree.set_type(id, TypeInfo::Unconstrained)?;
                return Ok(());
            };
            let outside_window = !tree
                .parent(id)
                .is_some_and(|p| matches!(tree.kind(p), Exp::WindowFunction(_)));
            if function.function_type == FunctionType::Window && outside_window {
                let err = SemanticError::InvalidWindowFunction(format!(
                    "{} requires an OVER clause",
                    function.name
                ));
                return fail(tree, ctx, id, err);
            }
            let args: Vec<Option<&TypeInfo>> =
                tree.children(id).iter().map(|&a| tree.type_info(a)).collect();
            function.result_type(&args)
        }
        Exp::WindowFunction(_) => child_type(tree, id, 0),
        Exp::Subquery => match subquery_type(tree, id) {
            Ok(Some(type_info)) => type_info,
            Ok(None) => return Ok(()),
            Err(err) => return fail(tree, ctx, id, err),
        },
        _ => return Ok(()),
    };
    tree.set_type(id, type_info)?;
    Ok(())
}

fn child_type(tree: &ExpTree, id: NodeId, index: usize) -> TypeInfo {
    tree.child(id, index)
        .and_then(|c| tree.type_info(c))
        .cloned()
        .unwrap_or(TypeInfo::Unconstrained)
}

fn binary_value_type(tree: &ExpTree, id: NodeId, op: BinaryValueOperator) -> TypeInfo {
    if op == BinaryValueOperator::Concat {
        return TypeInfo::string();
    }
    if op.is_bitwise() {
        return TypeInfo::long();
    }

    let side = |index| {
        tree.child(id, index)
            .filter(|&c| !tree.kind(c).is_parameter())
            .and_then(|c| tree.type_info(c))
            .and_then(TypeInfo::as_primitive)
    };
    match (side(0), side(1)) {
        (Some(PrimitiveType::Integer), Some(PrimitiveType::Integer)) => {
            TypeInfo::primitive(PrimitiveType::Integer)
        }
        (Some(l), Some(r)) if integral(l) && integral(r) => TypeInfo::long(),
        (Some(known), None) | (None, Some(known)) if known.is_numeric() => {
            TypeInfo::primitive(known)
        }
        _ => TypeInfo::double(),
    }
}

fn integral(kind: PrimitiveType) -> bool {
    matches!(kind, PrimitiveType::Integer | PrimitiveType::Long)
}

/// Type of a subquery in value position; `None` for FROM and EXISTS subqueries
fn subquery_type(tree: &ExpTree, id: NodeId) -> SemanticResult<Option<TypeInfo>> {
    let in_value_position = !tree
        .parent(id)
        .is_some_and(|p| matches!(tree.kind(p), Exp::Exists | Exp::SubqueryRef { .. }));
    if !in_value_position {
        return Ok(None);
    }
    let Some(selection) = tree.child(id, 0).and_then(|s| leading_selection(tree, s)) else {
        return Ok(Some(TypeInfo::Unconstrained));
    };
    match tree.children(selection) {
        [column] => Ok(Some(
            tree.type_info(*column)
                .cloned()
                .unwrap_or(TypeInfo::Unconstrained),
        )),
        columns => Err(SemanticError::InvalidSubquery(columns.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;
    use crate::testing;
    use ecsql_ir::{FunctionCall, Literal};

    fn finalized(tree: &mut ExpTree, id: NodeId) -> SemanticResult<TypeInfo> {
        let mut ctx = testing::context();
        finalize(tree, &mut ctx, id, 0)?;
        Ok(tree.type_info(id).cloned().unwrap_or(TypeInfo::Unconstrained))
    }

    #[test]
    fn test_arithmetic_widening() {
        let mut tree = ExpTree::new();
        let long = tree.literal(Literal::Long(1));
        let double = tree.literal(Literal::Double(1.5));
        let sum = tree.binary(long, BinaryValueOperator::Plus, double);
        assert_eq!(finalized(&mut tree, sum).unwrap(), TypeInfo::double());

        let mut tree = ExpTree::new();
        let a = tree.literal(Literal::Long(1));
        let b = tree.literal(Literal::Long(2));
        let sum = tree.binary(a, BinaryValueOperator::Multiply, b);
        assert_eq!(finalized(&mut tree, sum).unwrap(), TypeInfo::long());
    }

    #[test]
    fn test_parameter_operand_takes_other_side() {
        let mut tree = ExpTree::new();
        let a = tree.literal(Literal::Long(1));
        let p = tree.parameter(None);
        let sum = tree.binary(a, BinaryValueOperator::Minus, p);
        assert_eq!(finalized(&mut tree, sum).unwrap(), TypeInfo::long());

        let mut tree = ExpTree::new();
        let a = tree.literal(Literal::String("a".into()));
        let p = tree.parameter(None);
        let cat = tree.binary(a, BinaryValueOperator::Concat, p);
        assert_eq!(finalized(&mut tree, cat).unwrap(), TypeInfo::string());
    }

    #[test]
    fn test_function_types() {
        let mut tree = ExpTree::new();
        let arg = tree.literal(Literal::String("x".into()));
        let call = tree.function(FunctionCall::new("length"), vec![arg]);
        assert_eq!(finalized(&mut tree, call).unwrap(), TypeInfo::long());

        let mut tree = ExpTree::new();
        let call = tree.function(FunctionCall::new("my_host_fn"), vec![]);
        assert_eq!(finalized(&mut tree, call).unwrap(), TypeInfo::Unconstrained);
    }

    #[test]
    fn test_window_function_requires_over() {
        let mut tree = ExpTree::new();
        let call = tree.function(FunctionCall::new("ROW_NUMBER"), vec![]);
        let err = finalized(&mut tree, call).unwrap_err();
        assert_eq!(err.code(), "InvalidWindowFunction");
    }

    #[test]
    fn test_cast_and_null() {
        let mut tree = ExpTree::new();
        let null = tree.literal(Literal::Null);
        let cast = tree.cast(null, PrimitiveType::String);
        assert_eq!(finalized(&mut tree, cast).unwrap(), TypeInfo::string());
        assert_eq!(tree.type_info(null), Some(&TypeInfo::Null));
    }
}
