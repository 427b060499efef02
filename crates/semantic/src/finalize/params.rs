// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Parameters
//!
//! Parameters are indexed before finalization, in pre-order: the first
//! occurrence of a name takes the next 1-based index and later occurrences
//! share it. Unnamed `?` parameters each take their own index.
//!
//! After finalization every occurrence gets the type its position expects
//! (the other side of a comparison, the target of an assignment, `Long` for
//! LIMIT, ...). Occurrences of one named parameter must agree; positions that
//! expect nothing in particular do not count.

use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use ecsql_ir::{BinaryValueOperator, BooleanOperator, Exp, ExpTree, NodeId, TypeInfo, UnaryValueOperator};
use serde::Serialize;
use tracing::debug;

/// A parameter of an analyzed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    /// 1-based index
    pub index: u32,
    pub name: Option<String>,
    pub type_info: TypeInfo,
}

/// Assign indexes to every parameter below `root`
pub(crate) fn index_parameters(tree: &mut ExpTree, ctx: &mut ResolutionContext, root: NodeId) {
    for id in tree.descendants(root) {
        let Exp::Parameter(parameter) = tree.kind(id) else {
            continue;
        };
        let name = parameter.name.clone();
        let index = ctx.track_parameter(name.as_deref(), id);
        if let Exp::Parameter(parameter) = tree.kind_mut(id) {
            parameter.index = Some(index);
        }
    }
}

/// Type every parameter occurrence from its position
pub(crate) fn infer_parameter_types(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
) -> SemanticResult<Vec<ParameterInfo>> {
    let mut infos = Vec::new();
    for tracked in ctx.parameters().to_vec() {
        let mut merged: Option<TypeInfo> = None;
        for &occurrence in &tracked.occurrences {
            let expected = expected_type(tree, ctx, occurrence);
            if expected.is_open() {
                continue;
            }
            match &merged {
                None => merged = Some(expected),
                Some(known) if known.can_compare(&expected) => {}
                Some(known) => {
                    let err = SemanticError::TypeMismatch {
                        left: known.to_string(),
                        right: expected.to_string(),
                    };
                    return Err(ctx.error_at(tree, occurrence, err));
                }
            }
        }

        let type_info = merged.unwrap_or(TypeInfo::Unconstrained);
        debug!(index = tracked.index, name = ?tracked.name, %type_info, "inferred parameter type");
        for &occurrence in &tracked.occurrences {
            if tree.type_info(occurrence).is_none() {
                tree.set_type(occurrence, type_info.clone())?;
            }
        }
        infos.push(ParameterInfo {
            index: tracked.index,
            name: tracked.name.clone(),
            type_info,
        });
    }
    Ok(infos)
}

/// Type of a node usable as inference source; parameters and open types give none
fn known_type(tree: &ExpTree, node: NodeId) -> Option<TypeInfo> {
    if tree.kind(node).is_parameter() {
        return None;
    }
    tree.type_info(node).filter(|t| !t.is_open()).cloned()
}

/// First typed operand among `nodes`
fn first_known(tree: &ExpTree, nodes: &[NodeId]) -> Option<TypeInfo> {
    nodes.iter().find_map(|&n| known_type(tree, n))
}

fn expected_type(tree: &ExpTree, ctx: &ResolutionContext, param: NodeId) -> TypeInfo {
    let Some(parent) = tree.parent(param) else {
        return TypeInfo::Unconstrained;
    };
    let siblings = tree.children(parent);
    let position = siblings.iter().position(|&c| c == param).unwrap_or_default();
    let other = |index: usize| siblings.get(index).and_then(|&n| known_type(tree, n));

    let expected = match tree.kind(parent) {
        Exp::BinaryBoolean(op) => match op {
            BooleanOperator::And | BooleanOperator::Or => Some(TypeInfo::boolean()),
            BooleanOperator::Like | BooleanOperator::NotLike => Some(TypeInfo::string()),
            BooleanOperator::Between | BooleanOperator::NotBetween => siblings
                .get(1)
                .and_then(|&range| first_known(tree, tree.children(range))),
            BooleanOperator::In | BooleanOperator::NotIn => siblings.get(1).and_then(|&rhs| {
                match tree.kind(rhs) {
                    Exp::ValueList => first_known(tree, tree.children(rhs)),
                    _ => known_type(tree, rhs),
                }
            }),
            _ => other(1 - position.min(1)),
        },
        Exp::LikeEscape => Some(TypeInfo::string()),
        Exp::BetweenRange | Exp::ValueList => container_type(tree, parent, position),
        Exp::BinaryValue(op) if *op == BinaryValueOperator::Concat => Some(TypeInfo::string()),
        Exp::BinaryValue(op) if op.is_bitwise() => Some(TypeInfo::long()),
        Exp::BinaryValue(_) => Some(
            other(1 - position.min(1))
                .filter(TypeInfo::is_numeric)
                .unwrap_or_else(TypeInfo::double),
        ),
        Exp::UnaryValue(UnaryValueOperator::BitwiseNot) => Some(TypeInfo::long()),
        Exp::UnaryValue(_) => Some(TypeInfo::double()),
        Exp::Assignment if position == 1 => other(0),
        Exp::LimitOffset | Exp::WindowFrame(_) => Some(TypeInfo::long()),
        Exp::FunctionCall(call) => ctx
            .functions()
            .get_function(&call.name)
            .and_then(|f| f.parameter_type(position))
            .cloned(),
        Exp::Where | Exp::Having | Exp::Not => Some(TypeInfo::boolean()),
        _ => None,
    };
    expected.unwrap_or(TypeInfo::Unconstrained)
}

/// Expected type of item `position` of a BETWEEN range or value list
fn container_type(tree: &ExpTree, container: NodeId, position: usize) -> Option<TypeInfo> {
    let owner = tree.parent(container)?;
    match tree.kind(owner) {
        Exp::BinaryBoolean(_) => known_type(tree, tree.child(owner, 0)?),
        Exp::Insert => match tree.find_child(owner, |k| matches!(k, Exp::PropertyNameList)) {
            Some(list) => known_type(tree, tree.child(list, position)?),
            None => {
                let class = tree.kind(tree.child(owner, 0)?).as_class_name()?.class_map()?;
                class
                    .visible_properties()
                    .nth(position)
                    .map(|p| p.type_info.clone())
            }
        },
        _ => None,
    }
}
