// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! WITH, UPDATE, INSERT and DELETE statements

use super::select::resolve_class_name;
use super::{fail, finalize};
use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use crate::resolution::{leading_selection, resolve_property};
use crate::scope::ScopeArg;
use crate::symbol::RangeClassInfo;
use crate::typecheck::{Operand, check_assignment};
use ecsql_ir::{Exp, ExpTree, NodeId, PropertyTarget, TypeInfo};
use tracing::instrument;

/// `WITH blocks statement`: every block, then the main statement
#[instrument(skip(tree, ctx))]
pub(super) fn finalize_common_table(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    with: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    for child in tree.children(with).to_vec() {
        let Exp::CommonTableBlock(block) = tree.kind(child) else {
            finalize(tree, ctx, child, depth + 1)?;
            continue;
        };
        let (name, declared) = (block.name.clone(), block.columns.len());
        let Some(statement) = tree.child(child, 0) else {
            continue;
        };
        finalize(tree, ctx, statement, depth + 2)?;

        let returned = leading_selection(tree, statement).map_or(0, |s| tree.children(s).len());
        if declared > 0 && declared != returned {
            let err = SemanticError::CteColumnCountMismatch {
                cte: name,
                defined: declared,
                returned,
            };
            return fail(tree, ctx, child, err);
        }
        tree.mark_finalized(child);
    }
    Ok(())
}

/// Resolve the target class of a DML statement
fn target_range(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    statement: NodeId,
) -> SemanticResult<RangeClassInfo> {
    let class = tree
        .child(statement, 0)
        .filter(|&c| matches!(tree.kind(c), Exp::ClassName(_)));
    let Some(class) = class else {
        let err = SemanticError::UnknownClass(tree.kind(statement).kind_name().to_string());
        return fail(tree, ctx, statement, err);
    };
    resolve_class_name(tree, ctx, class)?;
    RangeClassInfo::from_node(tree, class)
        .ok_or_else(|| SemanticError::UnknownClass(tree.kind(class).kind_name().to_string()))
}

/// Resolve an assignment or INSERT target and return its type
///
/// Targets must be plain, non-system properties of the target class.
fn finalize_target(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    target: NodeId,
) -> SemanticResult<TypeInfo> {
    let found = match resolve_property(tree, ctx, target) {
        Ok(found) => found,
        Err(err) => return fail(tree, ctx, target, err),
    };
    let assignable = match &found.resolved.target {
        PropertyTarget::Class { class, property } => {
            found.resolved.member_path().is_empty()
                && class.find_property(property).is_some_and(|p| !p.system)
        }
        _ => false,
    };
    if !assignable {
        let path = found.resolved.path.to_string();
        return fail(tree, ctx, target, SemanticError::InvalidAssignmentTarget(path));
    }

    let type_info = found.type_info.clone();
    if let Exp::PropertyName(property) = tree.kind_mut(target) {
        property.resolved = Some(found.resolved);
    }
    tree.set_type(target, type_info.clone())?;
    tree.mark_finalized(target);
    Ok(type_info)
}

/// `UPDATE class SET target = value, ... [WHERE ...]`
#[instrument(skip(tree, ctx))]
pub(super) fn finalize_update(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    update: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    let range = target_range(tree, ctx, update)?;
    let mut scope = ctx.push_scope(ScopeArg::ranges(vec![range]));

    for clause in tree.children(update).to_vec() {
        if !matches!(tree.kind(clause), Exp::AssignmentList) {
            finalize(tree, &mut scope, clause, depth + 1)?;
            continue;
        }
        for assignment in tree.children(clause).to_vec() {
            let (Some(target), Some(value)) = (tree.child(assignment, 0), tree.child(assignment, 1))
            else {
                continue;
            };
            let target_type = finalize_target(tree, &mut scope, target)?;
            finalize(tree, &mut scope, value, depth + 3)?;
            if let Err(err) = Operand::of(tree, value).and_then(|v| check_assignment(&target_type, v)) {
                return fail(tree, &mut scope, assignment, err);
            }
            tree.mark_finalized(assignment);
        }
        tree.mark_finalized(clause);
    }
    Ok(())
}

/// `INSERT INTO class [(properties)] VALUES (values)`
#[instrument(skip(tree, ctx))]
pub(super) fn finalize_insert(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    insert: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    let range = target_range(tree, ctx, insert)?;
    let class = range.class_map().cloned();
    let listed = tree.find_child(insert, |k| matches!(k, Exp::PropertyNameList));

    let target_types: Vec<TypeInfo> = {
        let mut scope = ctx.push_scope(ScopeArg::ranges(vec![range]));
        match listed {
            Some(list) => {
                let mut types = Vec::new();
                for target in tree.children(list).to_vec() {
                    types.push(finalize_target(tree, &mut scope, target)?);
                }
                tree.mark_finalized(list);
                types
            }
            None => class
                .iter()
                .flat_map(|c| c.visible_properties())
                .map(|p| p.type_info.clone())
                .collect(),
        }
    };

    let Some(values) = tree.find_child(insert, |k| matches!(k, Exp::ValueList)) else {
        return Ok(());
    };
    finalize(tree, ctx, values, depth + 1)?;
    let value_nodes = tree.children(values).to_vec();
    if value_nodes.len() != target_types.len() {
        let err = SemanticError::ValueCountMismatch {
            properties: target_types.len(),
            values: value_nodes.len(),
        };
        return fail(tree, ctx, values, err);
    }
    for (target_type, value) in target_types.iter().zip(value_nodes) {
        if let Err(err) = Operand::of(tree, value).and_then(|v| check_assignment(target_type, v)) {
            return fail(tree, ctx, value, err);
        }
    }
    Ok(())
}

/// `DELETE FROM class [WHERE ...]`
#[instrument(skip(tree, ctx))]
pub(super) fn finalize_delete(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    delete: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    let range = target_range(tree, ctx, delete)?;
    let mut scope = ctx.push_scope(ScopeArg::ranges(vec![range]));
    for clause in tree.children(delete).to_vec() {
        finalize(tree, &mut scope, clause, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ecsql_ir::{
        BooleanOperator, ClassNameRef, CommonTableBlock, Literal, PrimitiveType, SelectClauses,
    };

    fn run(tree: &mut ExpTree, root: NodeId) -> SemanticResult<()> {
        tree.set_root(root);
        let mut ctx = testing::context();
        finalize(tree, &mut ctx, root, 0)
    }

    fn psa(tree: &mut ExpTree) -> NodeId {
        tree.class_name(ClassNameRef::new(Some("ecsql"), "PSA"))
    }

    #[test]
    fn test_update_assignments_are_typed() {
        let mut tree = ExpTree::new();
        let class = psa(&mut tree);
        let target = tree.property("L");
        let value = tree.parameter(None);
        let i = tree.property("I");
        let three = tree.literal(Literal::Long(3));
        let predicate = tree.boolean(i, BooleanOperator::Gt, three);
        let root = tree.update(class, vec![(target, value)], Some(predicate), vec![]);
        run(&mut tree, root).unwrap();
        assert_eq!(tree.type_info(target), Some(&TypeInfo::long()));
        assert!(tree.is_finalized(root));
    }

    #[test]
    fn test_update_rejects_member_and_system_targets() {
        for path in ["P2D.X", "ECInstanceId"] {
            let mut tree = ExpTree::new();
            let class = psa(&mut tree);
            let target = tree.property(path);
            let value = tree.parameter(None);
            let root = tree.update(class, vec![(target, value)], None, vec![]);
            assert_eq!(
                run(&mut tree, root).unwrap_err().code(),
                "InvalidAssignmentTarget",
                "{path}"
            );
        }
    }

    #[test]
    fn test_update_value_must_match_target() {
        let mut tree = ExpTree::new();
        let class = psa(&mut tree);
        let target = tree.property("P2D");
        let value = tree.literal(Literal::String("x".into()));
        let root = tree.update(class, vec![(target, value)], None, vec![]);
        assert_eq!(run(&mut tree, root).unwrap_err().code(), "TypeMismatch");
    }

    #[test]
    fn test_insert_value_count() {
        let mut tree = ExpTree::new();
        let class = psa(&mut tree);
        let i = tree.property("I");
        let s = tree.property("S");
        let one = tree.literal(Literal::Long(1));
        let root = tree.insert(class, vec![i, s], vec![one]);
        assert_eq!(
            run(&mut tree, root).unwrap_err(),
            SemanticError::ValueCountMismatch {
                properties: 2,
                values: 1
            }
        );
    }

    #[test]
    fn test_insert_without_property_list_uses_visible_properties() {
        let mut tree = ExpTree::new();
        let class = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let i = tree.parameter(None);
        let s = tree.literal(Literal::String("a".into()));
        let root = tree.insert(class, vec![], vec![i, s]);
        run(&mut tree, root).unwrap();
    }

    #[test]
    fn test_delete_where_resolves_against_target() {
        let mut tree = ExpTree::new();
        let class = psa(&mut tree);
        let d = tree.property("D");
        let param = tree.parameter(Some("d"));
        let predicate = tree.boolean(d, BooleanOperator::LtEq, param);
        let root = tree.delete(class, Some(predicate), vec![]);
        run(&mut tree, root).unwrap();
        assert_eq!(
            tree.type_info(d),
            Some(&TypeInfo::primitive(PrimitiveType::Double))
        );
    }

    #[test]
    fn test_cte_column_count() {
        let mut tree = ExpTree::new();
        let i = tree.property("I");
        let item = tree.derived(i, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let inner = tree.single_select(SelectClauses::new(vec![item], vec![from]));
        let inner = tree.select(inner);
        let one = tree.literal(Literal::Long(1));
        let outer_item = tree.derived(one, None);
        let outer = tree.single_select(SelectClauses::new(vec![outer_item], vec![]));
        let outer = tree.select(outer);
        let root = tree.common_table(
            false,
            vec![(CommonTableBlock::new("cte").with_columns(["a", "b"]), inner)],
            outer,
        );
        assert_eq!(
            run(&mut tree, root).unwrap_err(),
            SemanticError::CteColumnCountMismatch {
                cte: "cte".into(),
                defined: 2,
                returned: 1
            }
        );
    }
}
