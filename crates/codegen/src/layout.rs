// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mapping of ECSQL parameters onto native `?N` placeholders

use crate::error::{CodegenError, CodegenResult};
use ecsql_ir::{Exp, ExpTree, Parameter, TypeInfo};
use serde::Serialize;
use std::collections::BTreeMap;

/// One ECSQL parameter and the native placeholders bound to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSlot {
    /// 1-based ECSQL parameter index
    pub index: u32,
    pub name: Option<String>,
    pub type_info: TypeInfo,
    /// 1-based native placeholder indices, one per backing column
    pub sql_indices: Vec<u32>,
}

/// Placeholder assignment for all parameters of a statement
///
/// Native placeholders are numbered consecutively in ECSQL index order. A
/// parameter whose type spans several columns (points, navigation values,
/// structs) takes one placeholder per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterLayout {
    slots: Vec<ParameterSlot>,
}

impl ParameterLayout {
    /// Collect the indexed parameters of a tree. The first occurrence of an
    /// index supplies its name and type.
    pub fn from_tree(tree: &ExpTree) -> Self {
        let Some(root) = tree.root() else {
            return Self::default();
        };

        let mut parameters: BTreeMap<u32, (Option<String>, TypeInfo)> = BTreeMap::new();
        for id in tree.descendants(root) {
            if let Exp::Parameter(Parameter {
                name,
                index: Some(index),
            }) = tree.kind(id)
            {
                parameters.entry(*index).or_insert_with(|| {
                    let type_info = tree.type_info(id).cloned().unwrap_or(TypeInfo::Unconstrained);
                    (name.clone(), type_info)
                });
            }
        }

        let mut next = 1;
        let slots = parameters
            .into_iter()
            .map(|(index, (name, type_info))| {
                let width = type_info.column_count() as u32;
                let sql_indices = (next..next + width).collect();
                next += width;
                ParameterSlot {
                    index,
                    name,
                    type_info,
                    sql_indices,
                }
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[ParameterSlot] {
        &self.slots
    }

    pub fn slot(&self, index: u32) -> Option<&ParameterSlot> {
        self.slots.iter().find(|s| s.index == index)
    }

    /// Total number of native placeholders
    pub fn native_count(&self) -> usize {
        self.slots.iter().map(|s| s.sql_indices.len()).sum()
    }

    /// Native placeholder text for a parameter occurrence
    pub fn placeholders(&self, parameter: &Parameter) -> CodegenResult<Vec<String>> {
        let slot = parameter
            .index
            .and_then(|index| self.slot(index))
            .ok_or_else(|| {
                CodegenError::MissingParameter(
                    parameter.name.clone().unwrap_or_else(|| "?".to_string()),
                )
            })?;
        Ok(slot.sql_indices.iter().map(|i| format!("?{i}")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsql_ir::{BooleanOperator, NodeId, PrimitiveType};

    fn indexed(tree: &mut ExpTree, name: Option<&str>, index: u32, ty: TypeInfo) -> NodeId {
        let id = tree.parameter(name);
        if let Exp::Parameter(p) = tree.kind_mut(id) {
            p.index = Some(index);
        }
        tree.set_type(id, ty).unwrap();
        id
    }

    #[test]
    fn test_multi_column_parameters_take_consecutive_slots() {
        let mut tree = ExpTree::new();
        let a = indexed(&mut tree, None, 1, TypeInfo::long());
        let b = indexed(&mut tree, Some("pt"), 2, TypeInfo::primitive(PrimitiveType::Point3d));
        let c = indexed(&mut tree, Some("pt"), 2, TypeInfo::primitive(PrimitiveType::Point3d));
        let d = indexed(&mut tree, None, 3, TypeInfo::string());
        let bc = tree.boolean(b, BooleanOperator::Eq, c);
        let ad = tree.boolean(a, BooleanOperator::Eq, d);
        let root = tree.boolean(ad, BooleanOperator::And, bc);
        tree.set_root(root);

        let layout = ParameterLayout::from_tree(&tree);
        assert_eq!(layout.slots().len(), 3);
        assert_eq!(layout.slot(1).unwrap().sql_indices, vec![1]);
        assert_eq!(layout.slot(2).unwrap().sql_indices, vec![2, 3, 4]);
        assert_eq!(layout.slot(3).unwrap().sql_indices, vec![5]);
        assert_eq!(layout.native_count(), 5);

        let Exp::Parameter(pt) = tree.kind(c) else {
            panic!("expected parameter");
        };
        assert_eq!(layout.placeholders(pt).unwrap(), vec!["?2", "?3", "?4"]);
    }

    #[test]
    fn test_layout_serializes_slot_columns() {
        let mut tree = ExpTree::new();
        let a = indexed(&mut tree, None, 1, TypeInfo::long());
        let b = indexed(&mut tree, Some("pt"), 2, TypeInfo::primitive(PrimitiveType::Point3d));
        let root = tree.boolean(a, BooleanOperator::Eq, b);
        tree.set_root(root);

        let json = serde_json::to_value(ParameterLayout::from_tree(&tree)).unwrap();
        let slots = json["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0]["name"], serde_json::Value::Null);
        assert_eq!(slots[1]["index"], 2);
        assert_eq!(slots[1]["name"], "pt");
        assert_eq!(slots[1]["sql_indices"], serde_json::json!([2, 3, 4]));
    }

    #[test]
    fn test_unindexed_parameter_is_missing() {
        let layout = ParameterLayout::default();
        let parameter = Parameter {
            name: Some("x".into()),
            index: None,
        };
        assert_eq!(
            layout.placeholders(&parameter),
            Err(CodegenError::MissingParameter("x".into()))
        );
    }
}
