// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tree construction
//!
//! Convenience constructors used by the parser (and by tests) to assemble an
//! unresolved [`ExpTree`] in the child layout documented in [`crate::tree`].
//!
//! ```
//! use ecsql_ir::{BooleanOperator, ClassNameRef, ExpTree, SelectClauses};
//!
//! // SELECT I FROM ecsql.PSA WHERE I = ?
//! let mut tree = ExpTree::new();
//! let i = tree.property("I");
//! let item = tree.derived(i, None);
//! let class = tree.class_name(ClassNameRef::new(Some("ecsql"), "PSA"));
//! let lhs = tree.property("I");
//! let param = tree.parameter(None);
//! let predicate = tree.boolean(lhs, BooleanOperator::Eq, param);
//! let select = tree.single_select(
//!     SelectClauses::new(vec![item], vec![class]).with_where(predicate),
//! );
//! let root = tree.select(select);
//! tree.set_root(root);
//! ```

use crate::expr::{
    BinaryValueOperator, BooleanOperator, FunctionCall, Literal, Parameter, PropertyName,
    UnaryValueOperator,
};
use crate::path::PropertyPath;
use crate::query::{
    ClassNameRef, CommonTableBlock, CompoundOperator, CompoundSelect, DerivedProperty,
    JoinDirection, JoinKind, OptionEntry, RelationshipJoin, SetQuantifier, SortDirection,
    WindowFrame, WindowFunction,
};
use crate::tree::{Exp, ExpTree, NodeId};
use crate::types::PrimitiveType;

/// Clauses of a single SELECT
#[derive(Debug, Clone, Default)]
pub struct SelectClauses {
    pub quantifier: SetQuantifier,
    pub selection: Vec<NodeId>,
    pub from: Vec<NodeId>,
    pub where_clause: Option<NodeId>,
    pub group_by: Vec<NodeId>,
    pub having: Option<NodeId>,
    /// `WINDOW name AS (spec)` entries; specs built with [`ExpTree::window_spec`]
    pub windows: Vec<(String, NodeId)>,
    pub order_by: Vec<(NodeId, SortDirection)>,
    pub limit: Option<NodeId>,
    pub offset: Option<NodeId>,
    pub options: Vec<OptionEntry>,
}

impl SelectClauses {
    pub fn new(selection: Vec<NodeId>, from: Vec<NodeId>) -> Self {
        Self {
            selection,
            from,
            ..Default::default()
        }
    }

    pub fn with_quantifier(mut self, quantifier: SetQuantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    pub fn with_where(mut self, predicate: NodeId) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_group_by(mut self, keys: Vec<NodeId>) -> Self {
        self.group_by = keys;
        self
    }

    pub fn with_having(mut self, predicate: NodeId) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn with_window(mut self, name: impl Into<String>, spec: NodeId) -> Self {
        self.windows.push((name.into(), spec));
        self
    }

    pub fn with_order_by(mut self, keys: Vec<(NodeId, SortDirection)>) -> Self {
        self.order_by = keys;
        self
    }

    pub fn with_limit(mut self, limit: NodeId, offset: Option<NodeId>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.options.push(OptionEntry::new(name, value));
        self
    }
}

impl ExpTree {
    /// Property reference from dotted text (`"a.StructProp.Member"`, `"*"`)
    pub fn property(&mut self, path: &str) -> NodeId {
        self.add(
            Exp::PropertyName(PropertyName::new(PropertyPath::parse(path))),
            [],
        )
    }

    /// `?` when `name` is `None`, `:name` otherwise
    pub fn parameter(&mut self, name: Option<&str>) -> NodeId {
        self.add(
            Exp::Parameter(Parameter {
                name: name.map(str::to_string),
                index: None,
            }),
            [],
        )
    }

    pub fn literal(&mut self, literal: Literal) -> NodeId {
        self.add(Exp::Literal(literal), [])
    }

    pub fn boolean(&mut self, lhs: NodeId, op: BooleanOperator, rhs: NodeId) -> NodeId {
        self.add(Exp::BinaryBoolean(op), [lhs, rhs])
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        self.add(Exp::Not, [operand])
    }

    pub fn binary(&mut self, lhs: NodeId, op: BinaryValueOperator, rhs: NodeId) -> NodeId {
        self.add(Exp::BinaryValue(op), [lhs, rhs])
    }

    pub fn unary(&mut self, op: UnaryValueOperator, operand: NodeId) -> NodeId {
        self.add(Exp::UnaryValue(op), [operand])
    }

    pub fn function(&mut self, call: FunctionCall, args: Vec<NodeId>) -> NodeId {
        self.add(Exp::FunctionCall(call), args)
    }

    pub fn cast(&mut self, operand: NodeId, target: PrimitiveType) -> NodeId {
        self.add(Exp::Cast(target), [operand])
    }

    pub fn value_list(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add(Exp::ValueList, items)
    }

    /// `value [NOT] IN (items)`
    pub fn in_list(&mut self, value: NodeId, items: Vec<NodeId>, negated: bool) -> NodeId {
        let list = self.value_list(items);
        let op = if negated {
            BooleanOperator::NotIn
        } else {
            BooleanOperator::In
        };
        self.boolean(value, op, list)
    }

    /// `value [NOT] BETWEEN lower AND upper`
    pub fn between(&mut self, value: NodeId, lower: NodeId, upper: NodeId, negated: bool) -> NodeId {
        let range = self.add(Exp::BetweenRange, [lower, upper]);
        let op = if negated {
            BooleanOperator::NotBetween
        } else {
            BooleanOperator::Between
        };
        self.boolean(value, op, range)
    }

    /// `value [NOT] LIKE pattern [ESCAPE escape]`
    pub fn like(
        &mut self,
        value: NodeId,
        pattern: NodeId,
        escape: Option<NodeId>,
        negated: bool,
    ) -> NodeId {
        let rhs = match escape {
            Some(escape) => self.add(Exp::LikeEscape, [pattern, escape]),
            None => pattern,
        };
        let op = if negated {
            BooleanOperator::NotLike
        } else {
            BooleanOperator::Like
        };
        self.boolean(value, op, rhs)
    }

    /// Wrap a `SelectStatement` (or `CommonTable`) as a subquery value
    pub fn subquery(&mut self, statement: NodeId) -> NodeId {
        self.add(Exp::Subquery, [statement])
    }

    pub fn exists(&mut self, statement: NodeId) -> NodeId {
        let subquery = self.subquery(statement);
        self.add(Exp::Exists, [subquery])
    }

    /// Mark a node as written inside parentheses
    pub fn parenthesize(&mut self, id: NodeId) -> NodeId {
        self.set_parentheses(id, true);
        id
    }

    pub fn derived(&mut self, value: NodeId, alias: Option<&str>) -> NodeId {
        self.add(
            Exp::DerivedProperty(DerivedProperty {
                alias: alias.map(str::to_string),
            }),
            [value],
        )
    }

    pub fn class_name(&mut self, class: ClassNameRef) -> NodeId {
        self.add(Exp::ClassName(class), [])
    }

    /// `(statement) alias` in a FROM clause
    pub fn subquery_ref(&mut self, statement: NodeId, alias: Option<&str>) -> NodeId {
        let subquery = self.subquery(statement);
        self.add(
            Exp::SubqueryRef {
                alias: alias.map(str::to_string),
            },
            [subquery],
        )
    }

    pub fn join(&mut self, kind: JoinKind, lhs: NodeId, rhs: NodeId, on: Option<NodeId>) -> NodeId {
        let children: Vec<NodeId> = [Some(lhs), Some(rhs), on].into_iter().flatten().collect();
        self.add(Exp::Join(kind), children)
    }

    /// `from JOIN to USING relationship [FORWARD|BACKWARD]`
    pub fn relationship_join(
        &mut self,
        from: NodeId,
        to: NodeId,
        relationship: NodeId,
        direction: JoinDirection,
    ) -> NodeId {
        self.add(
            Exp::RelationshipJoin(RelationshipJoin {
                direction,
                resolved: None,
            }),
            [from, to, relationship],
        )
    }

    /// `[PARTITION BY ...] [ORDER BY ...] [frame]`
    pub fn window_spec(
        &mut self,
        base: Option<&str>,
        partition_by: Vec<NodeId>,
        order_by: Vec<(NodeId, SortDirection)>,
        frame: Option<(WindowFrame, Vec<NodeId>)>,
    ) -> NodeId {
        let mut children = Vec::new();
        if !partition_by.is_empty() {
            children.push(self.add(Exp::WindowPartition, partition_by));
        }
        if !order_by.is_empty() {
            children.push(self.order_by(order_by));
        }
        if let Some((frame, offsets)) = frame {
            children.push(self.add(Exp::WindowFrame(frame), offsets));
        }
        self.add(
            Exp::WindowSpec {
                base: base.map(str::to_string),
            },
            children,
        )
    }

    /// `call OVER name` or `call OVER (spec)`
    pub fn window_function(
        &mut self,
        call: NodeId,
        window_name: Option<&str>,
        spec: Option<NodeId>,
    ) -> NodeId {
        let children: Vec<NodeId> = [Some(call), spec].into_iter().flatten().collect();
        self.add(
            Exp::WindowFunction(WindowFunction {
                window_name: window_name.map(str::to_string),
            }),
            children,
        )
    }

    fn order_by(&mut self, keys: Vec<(NodeId, SortDirection)>) -> NodeId {
        let specs: Vec<NodeId> = keys
            .into_iter()
            .map(|(key, direction)| self.add(Exp::OrderBySpec(direction), [key]))
            .collect();
        self.add(Exp::OrderBy, specs)
    }

    pub fn single_select(&mut self, clauses: SelectClauses) -> NodeId {
        let mut children = vec![self.add(Exp::Selection, clauses.selection)];
        if !clauses.from.is_empty() {
            children.push(self.add(Exp::From, clauses.from));
        }
        if let Some(predicate) = clauses.where_clause {
            children.push(self.add(Exp::Where, [predicate]));
        }
        if !clauses.group_by.is_empty() {
            children.push(self.add(Exp::GroupBy, clauses.group_by));
        }
        if let Some(predicate) = clauses.having {
            children.push(self.add(Exp::Having, [predicate]));
        }
        if !clauses.windows.is_empty() {
            let windows: Vec<NodeId> = clauses
                .windows
                .into_iter()
                .map(|(name, spec)| self.add(Exp::NamedWindow { name }, [spec]))
                .collect();
            children.push(self.add(Exp::WindowClause, windows));
        }
        if !clauses.order_by.is_empty() {
            children.push(self.order_by(clauses.order_by));
        }
        if let Some(limit) = clauses.limit {
            let parts: Vec<NodeId> = [Some(limit), clauses.offset].into_iter().flatten().collect();
            children.push(self.add(Exp::LimitOffset, parts));
        }
        if !clauses.options.is_empty() {
            children.push(self.add(Exp::Options(clauses.options), []));
        }
        self.add(Exp::SingleSelect(clauses.quantifier), children)
    }

    /// Non-compound SELECT statement
    pub fn select(&mut self, single: NodeId) -> NodeId {
        self.add(
            Exp::SelectStatement(CompoundSelect {
                operator: None,
                all: false,
            }),
            [single],
        )
    }

    /// `single op [ALL] rest`, where `rest` is a `SelectStatement`
    pub fn compound(
        &mut self,
        single: NodeId,
        operator: CompoundOperator,
        all: bool,
        rest: NodeId,
    ) -> NodeId {
        self.add(
            Exp::SelectStatement(CompoundSelect {
                operator: Some(operator),
                all,
            }),
            [single, rest],
        )
    }

    /// `WITH [RECURSIVE] blocks statement`
    pub fn common_table(
        &mut self,
        recursive: bool,
        blocks: Vec<(CommonTableBlock, NodeId)>,
        statement: NodeId,
    ) -> NodeId {
        let mut children: Vec<NodeId> = blocks
            .into_iter()
            .map(|(block, select)| self.add(Exp::CommonTableBlock(block), [select]))
            .collect();
        children.push(statement);
        self.add(Exp::CommonTable { recursive }, children)
    }

    /// `UPDATE class SET target = value, ... [WHERE predicate]`
    pub fn update(
        &mut self,
        class: NodeId,
        assignments: Vec<(NodeId, NodeId)>,
        where_clause: Option<NodeId>,
        options: Vec<OptionEntry>,
    ) -> NodeId {
        let assignments: Vec<NodeId> = assignments
            .into_iter()
            .map(|(target, value)| self.add(Exp::Assignment, [target, value]))
            .collect();
        let mut children = vec![class, self.add(Exp::AssignmentList, assignments)];
        if let Some(predicate) = where_clause {
            children.push(self.add(Exp::Where, [predicate]));
        }
        if !options.is_empty() {
            children.push(self.add(Exp::Options(options), []));
        }
        self.add(Exp::Update, children)
    }

    /// `INSERT INTO class [(properties)] VALUES (values)`
    pub fn insert(&mut self, class: NodeId, properties: Vec<NodeId>, values: Vec<NodeId>) -> NodeId {
        let mut children = vec![class];
        if !properties.is_empty() {
            children.push(self.add(Exp::PropertyNameList, properties));
        }
        children.push(self.value_list(values));
        self.add(Exp::Insert, children)
    }

    /// `DELETE FROM class [WHERE predicate]`
    pub fn delete(
        &mut self,
        class: NodeId,
        where_clause: Option<NodeId>,
        options: Vec<OptionEntry>,
    ) -> NodeId {
        let mut children = vec![class];
        if let Some(predicate) = where_clause {
            children.push(self.add(Exp::Where, [predicate]));
        }
        if !options.is_empty() {
            children.push(self.add(Exp::Options(options), []));
        }
        self.add(Exp::Delete, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_select_clause_order() {
        let mut tree = ExpTree::new();
        let p = tree.property("I");
        let item = tree.derived(p, None);
        let class = tree.class_name(ClassNameRef::new(None, "PSA"));
        let key = tree.property("I");
        let limit = tree.literal(Literal::Long(10));
        let select = tree.single_select(
            SelectClauses::new(vec![item], vec![class])
                .with_order_by(vec![(key, SortDirection::Descending)])
                .with_limit(limit, None),
        );

        let kinds: Vec<&str> = tree
            .children(select)
            .iter()
            .map(|&c| tree.kind(c).kind_name())
            .collect();
        assert_eq!(kinds, vec!["select list", "FROM", "ORDER BY", "LIMIT"]);
    }

    #[test]
    fn test_like_with_escape() {
        let mut tree = ExpTree::new();
        let value = tree.property("S");
        let pattern = tree.literal(Literal::String("a\\%".into()));
        let escape = tree.literal(Literal::String("\\".into()));
        let like = tree.like(value, pattern, Some(escape), true);

        assert!(matches!(
            tree.kind(like),
            Exp::BinaryBoolean(BooleanOperator::NotLike)
        ));
        let rhs = tree.child(like, 1).unwrap();
        assert!(matches!(tree.kind(rhs), Exp::LikeEscape));
        assert_eq!(tree.children(rhs), &[pattern, escape]);
    }

    #[test]
    fn test_update_layout() {
        let mut tree = ExpTree::new();
        let class = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let target = tree.property("L");
        let value = tree.parameter(None);
        let update = tree.update(class, vec![(target, value)], None, vec![]);

        assert_eq!(tree.children(update).len(), 2);
        let list = tree.child(update, 1).unwrap();
        let assignment = tree.child(list, 0).unwrap();
        assert_eq!(tree.children(assignment), &[target, value]);
    }
}
