// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Native SQL renderer
//!
//! Turns a finalized tree into SQL for the backing engine.
//!
//! Value expressions render to one snippet per native column: a `Point3d`
//! property yields three column references, a navigation property two.
//! Comparisons between multi-column values are expanded column by column.
//! A single-column side (a `NULL` literal, say) is repeated for every column
//! of the other side.
//!
//! Property references through a subquery or common table render the alias
//! recorded on the referenced derived property during analysis, so every
//! reference to the same output column renders identically.

use crate::builder::SqlBuilder;
use crate::error::{CodegenError, CodegenResult};
use crate::layout::ParameterLayout;
use crate::tokens::{Keyword, quote_identifier, quote_string};
use ecsql_ir::{
    BooleanOperator, ClassMap, ClassNameRef, ClassRefTarget, Exp, ExpTree, FrameBound, FunctionCall,
    Literal, NodeId, PropertyName, PropertyTarget, RelationshipJoin, SOURCE_ECINSTANCEID,
    TARGET_ECINSTANCEID, TypeInfo, WindowFrame, WindowFunction,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Render a finalized tree as native SQL
pub fn render_native_sql(tree: &ExpTree, layout: &ParameterLayout) -> CodegenResult<String> {
    NativeSqlRenderer::new(tree, layout).render()
}

/// Column names of an output column, `name` or `name_0`, `name_1`, ... when
/// the value spans several columns
pub fn column_names(name: &str, width: usize) -> Vec<String> {
    if width <= 1 {
        vec![name.to_string()]
    } else {
        (0..width).map(|i| format!("{name}_{i}")).collect()
    }
}

/// Native SQL renderer over one finalized tree
pub struct NativeSqlRenderer<'a> {
    tree: &'a ExpTree,
    layout: &'a ParameterLayout,
    builder: SqlBuilder,
    /// `ECClassId` filters of `ONLY` classes in the FROM list being rendered
    filters: Vec<String>,
}

impl<'a> NativeSqlRenderer<'a> {
    pub fn new(tree: &'a ExpTree, layout: &'a ParameterLayout) -> Self {
        Self {
            tree,
            layout,
            builder: SqlBuilder::new(),
            filters: Vec::new(),
        }
    }

    #[instrument(skip_all)]
    pub fn render(mut self) -> CodegenResult<String> {
        let root = self.tree.root().ok_or(CodegenError::MissingRoot)?;
        if !self.tree.is_finalized(root) {
            return Err(CodegenError::NotFinalized {
                node: root,
                kind: self.tree.kind(root).kind_name().to_string(),
            });
        }
        self.statement(root)?;
        let sql = self.builder.finish();
        debug!(%sql, "rendered native SQL");
        Ok(sql)
    }

    fn statement(&mut self, id: NodeId) -> CodegenResult<()> {
        let tree = self.tree;
        match tree.kind(id) {
            Exp::SelectStatement(compound) => {
                self.single_select(self.child(id, 0)?)?;
                if let (Some(operator), Some(rest)) = (compound.operator, tree.child(id, 1)) {
                    self.builder.append_spaced(operator.keyword());
                    if compound.all {
                        self.builder.append_spaced("ALL");
                    }
                    self.builder.append(" ");
                    self.statement(rest)?;
                }
                Ok(())
            }
            Exp::CommonTable { recursive } => self.common_table(id, *recursive),
            Exp::Update => self.update(id),
            Exp::Insert => self.insert(id),
            Exp::Delete => self.delete(id),
            other => Err(CodegenError::unexpected("statement", other.kind_name())),
        }
    }

    /// Render a nested statement into an isolated buffer
    fn isolated(&mut self, id: NodeId) -> CodegenResult<String> {
        self.builder.push();
        self.statement(id)?;
        Ok(self.builder.pop())
    }

    fn single_select(&mut self, id: NodeId) -> CodegenResult<()> {
        let tree = self.tree;
        let Exp::SingleSelect(quantifier) = tree.kind(id) else {
            return Err(CodegenError::unexpected("SELECT", tree.kind(id).kind_name()));
        };
        self.builder.append("SELECT");
        if !quantifier.keyword().is_empty() {
            self.builder.append_spaced(quantifier.keyword());
        }

        let has_where = tree.find_child(id, |k| matches!(k, Exp::Where)).is_some();
        let mut filters = Vec::new();
        for &clause in tree.children(id) {
            match tree.kind(clause) {
                Exp::Selection => {
                    let items = self.selection(clause)?;
                    self.builder.append_spaced(&items);
                }
                Exp::From => {
                    let outer = std::mem::take(&mut self.filters);
                    let ranges = self.list(clause, |r, id| r.range(id))?;
                    filters = std::mem::replace(&mut self.filters, outer);
                    self.builder.append(" FROM ").append(&ranges.join(", "));
                    if !has_where {
                        self.where_clause(None, std::mem::take(&mut filters))?;
                    }
                }
                Exp::Where => {
                    let predicate = self.child(clause, 0)?;
                    self.where_clause(Some(predicate), std::mem::take(&mut filters))?;
                }
                Exp::GroupBy => {
                    let keys = self.list(clause, |r, id| r.value(id))?;
                    self.builder.append(" GROUP BY ").append(&keys.concat().join(", "));
                }
                Exp::Having => {
                    let predicate = self.predicate(self.child(clause, 0)?)?;
                    self.builder.append(" HAVING ").append(&predicate);
                }
                Exp::WindowClause => {
                    let windows = self.list(clause, |r, named| {
                        let Exp::NamedWindow { name } = r.tree.kind(named) else {
                            return Err(CodegenError::unexpected("WINDOW", r.tree.kind(named).kind_name()));
                        };
                        Ok(format!("{name} AS ({})", r.window_spec(r.child(named, 0)?)?))
                    })?;
                    self.builder.append(" WINDOW ").append(&windows.join(", "));
                }
                Exp::OrderBy => {
                    let keys = self.order_by(clause)?;
                    self.builder.append(" ORDER BY ").append(&keys);
                }
                Exp::LimitOffset => {
                    let limit = self.scalar(self.child(clause, 0)?)?;
                    self.builder.append(" LIMIT ").append(&limit);
                    if let Some(offset) = tree.child(clause, 1) {
                        let offset = self.scalar(offset)?;
                        self.builder.append(" OFFSET ").append(&offset);
                    }
                }
                Exp::Options(_) => {}
                other => return Err(CodegenError::unexpected("SELECT", other.kind_name())),
            }
        }
        Ok(())
    }

    fn where_clause(&mut self, predicate: Option<NodeId>, filters: Vec<String>) -> CodegenResult<()> {
        let mut conditions = Vec::new();
        if let Some(predicate) = predicate {
            let text = self.predicate(predicate)?;
            if filters.is_empty() {
                conditions.push(text);
            } else {
                conditions.push(format!("({text})"));
            }
        }
        conditions.extend(filters);
        if !conditions.is_empty() {
            self.builder.append(" WHERE ").append(&conditions.join(" AND "));
        }
        Ok(())
    }

    fn selection(&mut self, id: NodeId) -> CodegenResult<String> {
        let tree = self.tree;
        let mut items = Vec::new();
        for &derived in tree.children(id) {
            let snippets = self.value(self.child(derived, 0)?)?;
            match self.output_names(derived) {
                Some(names) => {
                    if names.len() != snippets.len() {
                        return Err(CodegenError::ColumnCountMismatch {
                            left: names.len(),
                            right: snippets.len(),
                            context: "select list".to_string(),
                        });
                    }
                    items.extend(
                        snippets
                            .into_iter()
                            .zip(names)
                            .map(|(value, name)| format!("{value} AS {}", quote_identifier(&name))),
                    );
                }
                None => items.extend(snippets),
            }
        }
        Ok(items.join(", "))
    }

    /// Output column names of a derived property, if it has a name
    fn output_names(&self, derived: NodeId) -> Option<Vec<String>> {
        let name = self.tree.render_alias(derived).or_else(|| {
            self.tree
                .kind(derived)
                .as_derived_property()
                .and_then(|d| d.alias.as_deref())
        })?;
        Some(column_names(name, self.width(derived)))
    }

    fn width(&self, id: NodeId) -> usize {
        self.tree.type_info(id).map_or(1, TypeInfo::column_count)
    }

    fn range(&mut self, id: NodeId) -> CodegenResult<String> {
        let tree = self.tree;
        match tree.kind(id) {
            Exp::ClassName(class) => self.class_range(class),
            Exp::SubqueryRef { alias } => {
                let subquery = self.child(id, 0)?;
                let sql = self.isolated(self.child(subquery, 0)?)?;
                Ok(match alias {
                    Some(alias) => format!("({sql}) {}", quote_identifier(alias)),
                    None => format!("({sql})"),
                })
            }
            Exp::Join(kind) => {
                let lhs = self.range(self.child(id, 0)?)?;
                let rhs = self.range(self.child(id, 1)?)?;
                let mut out = format!("{lhs} {} {rhs}", kind.keyword());
                if let Some(on) = tree.child(id, 2) {
                    out.push_str(" ON ");
                    out.push_str(&self.predicate(on)?);
                }
                Ok(out)
            }
            Exp::RelationshipJoin(join) => self.relationship_join(id, join),
            other => Err(CodegenError::unexpected("FROM", other.kind_name())),
        }
    }

    fn class_range(&mut self, class: &ClassNameRef) -> CodegenResult<String> {
        match &class.resolved {
            Some(ClassRefTarget::Class(map)) => {
                let display = quote_identifier(class.display_name());
                if !class.polymorphic {
                    self.filters.push(only_filter(Some(&display), map));
                }
                Ok(format!("{} {display}", quote_identifier(&map.table)))
            }
            Some(ClassRefTarget::CommonTable(block)) => {
                let Exp::CommonTableBlock(block) = self.tree.kind(*block) else {
                    return Err(CodegenError::UnresolvedClass(class.name.clone()));
                };
                Ok(match &class.alias {
                    Some(alias) => format!(
                        "{} {}",
                        quote_identifier(&block.name),
                        quote_identifier(alias)
                    ),
                    None => quote_identifier(&block.name),
                })
            }
            None => Err(CodegenError::UnresolvedClass(class.name.clone())),
        }
    }

    /// `from INNER JOIN [link] ON ... INNER JOIN [to] ON ...`
    fn relationship_join(&mut self, id: NodeId, join: &RelationshipJoin) -> CodegenResult<String> {
        let tree = self.tree;
        let to = self.child(id, 1)?;
        let relationship = self.child(id, 2)?;
        let rel_ref = tree
            .kind(relationship)
            .as_class_name()
            .ok_or_else(|| CodegenError::unexpected("relationship JOIN", tree.kind(relationship).kind_name()))?;
        let ends = join
            .resolved
            .ok_or_else(|| CodegenError::UnresolvedClass(rel_ref.name.clone()))?;
        let rel_map = self.resolved_class(relationship)?;

        // `to` plays one end, the matching FROM entry the other
        let (other, to_is_target) = if ends.target == to {
            (ends.source, true)
        } else {
            (ends.target, false)
        };
        let (other_column, to_column) = if to_is_target {
            (SOURCE_ECINSTANCEID, TARGET_ECINSTANCEID)
        } else {
            (TARGET_ECINSTANCEID, SOURCE_ECINSTANCEID)
        };
        let other_map = self.resolved_class(other)?;
        let to_map = self.resolved_class(to)?;
        let other_display = quote_identifier(self.class_ref(other)?.display_name());
        let to_display = quote_identifier(self.class_ref(to)?.display_name());
        let rel_display = quote_identifier(rel_ref.display_name());

        let lhs = self.range(self.child(id, 0)?)?;
        let link = self.class_range(rel_ref)?;
        let rhs = self.range(to)?;
        Ok(format!(
            "{lhs} INNER JOIN {link} ON {rel_display}.{} = {other_display}.{} INNER JOIN {rhs} ON {to_display}.{} = {rel_display}.{}",
            quote_identifier(system_column(&rel_map, other_column)),
            quote_identifier(other_map.instance_id_column()),
            quote_identifier(to_map.instance_id_column()),
            quote_identifier(system_column(&rel_map, to_column)),
        ))
    }

    fn class_ref(&self, id: NodeId) -> CodegenResult<&'a ClassNameRef> {
        let tree = self.tree;
        tree.kind(id)
            .as_class_name()
            .ok_or_else(|| CodegenError::unexpected("class reference", tree.kind(id).kind_name()))
    }

    fn resolved_class(&self, id: NodeId) -> CodegenResult<Arc<ClassMap>> {
        let class = self.class_ref(id)?;
        class
            .class_map()
            .cloned()
            .ok_or_else(|| CodegenError::UnresolvedClass(class.name.clone()))
    }

    fn common_table(&mut self, id: NodeId, recursive: bool) -> CodegenResult<()> {
        let tree = self.tree;
        let (statement, blocks) = tree
            .children(id)
            .split_last()
            .ok_or_else(|| CodegenError::unexpected("WITH", "empty clause"))?;
        self.builder.append("WITH ");
        if recursive {
            self.builder.append("RECURSIVE ");
        }
        for (i, &block_id) in blocks.iter().enumerate() {
            let Exp::CommonTableBlock(block) = tree.kind(block_id) else {
                return Err(CodegenError::unexpected("WITH", tree.kind(block_id).kind_name()));
            };
            if i > 0 {
                self.builder.append(", ");
            }
            self.builder.append(&quote_identifier(&block.name));
            let select = self.child(block_id, 0)?;
            if !block.columns.is_empty() {
                let widths: Vec<usize> = self
                    .leading_selection(select)
                    .map(|selection| tree.children(selection).iter().map(|&d| self.width(d)).collect())
                    .unwrap_or_default();
                let columns: Vec<String> = block
                    .columns
                    .iter()
                    .enumerate()
                    .flat_map(|(position, name)| {
                        column_names(name, widths.get(position).copied().unwrap_or(1))
                    })
                    .map(|name| quote_identifier(&name))
                    .collect();
                self.builder.append(&format!("({})", columns.join(", ")));
            }
            let sql = self.isolated(select)?;
            self.builder.append(&format!(" AS ({sql})"));
        }
        self.builder.append(" ");
        self.statement(*statement)
    }

    /// SELECT list of the first branch of a statement
    fn leading_selection(&self, statement: NodeId) -> Option<NodeId> {
        let single = self.tree.child(statement, 0)?;
        self.tree.find_child(single, |k| matches!(k, Exp::Selection))
    }

    fn update(&mut self, id: NodeId) -> CodegenResult<()> {
        let tree = self.tree;
        let class = self.child(id, 0)?;
        let map = self.resolved_class(class)?;
        let filters = self.dml_filters(class, &map)?;
        self.builder
            .append("UPDATE ")
            .append(&quote_identifier(&map.table))
            .append(" SET ");

        let assignments = self.child(id, 1)?;
        let mut set_list = Vec::new();
        for &assignment in tree.children(assignments) {
            let targets = self.value(self.child(assignment, 0)?)?;
            let values = self.value(self.child(assignment, 1)?)?;
            let pairs = pair_columns(targets, values, "assignment")?;
            set_list.extend(pairs.into_iter().map(|(t, v)| format!("{t} = {v}")));
        }
        self.builder.append(&set_list.join(", "));

        let predicate = tree
            .find_child(id, |k| matches!(k, Exp::Where))
            .map(|w| self.child(w, 0))
            .transpose()?;
        self.where_clause(predicate, filters)
    }

    fn insert(&mut self, id: NodeId) -> CodegenResult<()> {
        let tree = self.tree;
        let class = self.child(id, 0)?;
        let map = self.resolved_class(class)?;

        let mut columns = vec![quote_identifier(map.class_id_column())];
        match tree.find_child(id, |k| matches!(k, Exp::PropertyNameList)) {
            Some(list) => {
                for snippets in self.list(list, |r, p| r.value(p))? {
                    columns.extend(snippets);
                }
            }
            None => columns.extend(
                map.visible_properties()
                    .flat_map(|p| p.columns.iter())
                    .map(|c| quote_identifier(c)),
            ),
        }

        let values = tree
            .find_child(id, |k| matches!(k, Exp::ValueList))
            .ok_or_else(|| CodegenError::unexpected("INSERT", "missing VALUES"))?;
        let mut snippets = vec![map.id.to_string()];
        for value in self.list(values, |r, v| r.value(v))? {
            snippets.extend(value);
        }
        if snippets.len() != columns.len() {
            return Err(CodegenError::ColumnCountMismatch {
                left: columns.len(),
                right: snippets.len(),
                context: "INSERT".to_string(),
            });
        }

        self.builder
            .append("INSERT INTO ")
            .append(&quote_identifier(&map.table))
            .append(&format!(" ({}) VALUES ({})", columns.join(", "), snippets.join(", ")));
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> CodegenResult<()> {
        let class = self.child(id, 0)?;
        let map = self.resolved_class(class)?;
        let filters = self.dml_filters(class, &map)?;
        self.builder
            .append("DELETE FROM ")
            .append(&quote_identifier(&map.table));
        let predicate = self
            .tree
            .find_child(id, |k| matches!(k, Exp::Where))
            .map(|w| self.child(w, 0))
            .transpose()?;
        self.where_clause(predicate, filters)
    }

    /// Target classes of UPDATE/DELETE are unaliased
    fn dml_filters(&self, class: NodeId, map: &ClassMap) -> CodegenResult<Vec<String>> {
        if self.class_ref(class)?.polymorphic {
            Ok(Vec::new())
        } else {
            Ok(vec![only_filter(None, map)])
        }
    }

    fn predicate(&mut self, id: NodeId) -> CodegenResult<String> {
        Ok(self.value(id)?.join(" AND "))
    }

    /// Render a value that must occupy exactly one column
    fn scalar(&mut self, id: NodeId) -> CodegenResult<String> {
        let mut snippets = self.value(id)?;
        if snippets.len() != 1 {
            return Err(CodegenError::ColumnCountMismatch {
                left: snippets.len(),
                right: 1,
                context: self.tree.kind(id).kind_name().to_string(),
            });
        }
        Ok(snippets.remove(0))
    }

    fn value(&mut self, id: NodeId) -> CodegenResult<Vec<String>> {
        let tree = self.tree;
        let snippets = match tree.kind(id) {
            Exp::Literal(literal) => vec![literal_sql(literal)],
            Exp::Parameter(parameter) => self.layout.placeholders(parameter)?,
            Exp::PropertyName(property) => self.property(property)?,
            Exp::BinaryBoolean(op) => vec![self.boolean(id, *op)?],
            Exp::Not => vec![format!("NOT {}", self.scalar(self.child(id, 0)?)?)],
            Exp::BinaryValue(op) => {
                let lhs = self.scalar(self.child(id, 0)?)?;
                let rhs = self.scalar(self.child(id, 1)?)?;
                vec![format!("{lhs} {} {rhs}", op.keyword())]
            }
            Exp::UnaryValue(op) => {
                vec![format!("{}{}", op.keyword(), self.scalar(self.child(id, 0)?)?)]
            }
            Exp::FunctionCall(call) => vec![self.function_call(id, call)?],
            Exp::WindowFunction(function) => vec![self.window_function(id, function)?],
            Exp::Cast(target) => {
                let operand = self.scalar(self.child(id, 0)?)?;
                vec![format!("CAST({operand} AS {})", target.sql_affinity())]
            }
            Exp::Subquery => {
                let sql = self.isolated(self.child(id, 0)?)?;
                vec![format!("({sql})")]
            }
            Exp::Exists => {
                let subquery = self.child(id, 0)?;
                let sql = self.isolated(self.child(subquery, 0)?)?;
                vec![format!("EXISTS ({sql})")]
            }
            Exp::ValueList => {
                let items = self.list(id, |r, item| r.value(item))?;
                vec![format!("({})", items.concat().join(", "))]
            }
            other => return Err(CodegenError::unexpected("value expression", other.kind_name())),
        };

        let parenthesized = tree.node(id).has_parentheses()
            && !matches!(tree.kind(id), Exp::Subquery | Exp::ValueList);
        if parenthesized {
            Ok(snippets.into_iter().map(|s| format!("({s})")).collect())
        } else {
            Ok(snippets)
        }
    }

    fn property(&self, property: &PropertyName) -> CodegenResult<Vec<String>> {
        let unresolved = || CodegenError::UnresolvedProperty(property.path.to_string());
        let resolved = property.resolved.as_ref().ok_or_else(unresolved)?;
        match &resolved.target {
            PropertyTarget::Class {
                class,
                property: name,
            } => {
                let map = class.find_property(name).ok_or_else(unresolved)?;
                let layout = map
                    .type_info
                    .member_path(resolved.member_path())
                    .ok_or_else(unresolved)?;
                let columns = map.columns.get(layout.columns).ok_or_else(unresolved)?;
                let prefix = self.range_prefix(resolved.range);
                Ok(columns
                    .iter()
                    .map(|c| qualified(prefix, c))
                    .collect())
            }
            PropertyTarget::Derived { derived } => {
                let prefix = self.range_prefix(resolved.range);
                self.derived_columns(*derived, resolved.member_path(), prefix)
            }
            PropertyTarget::SelectAlias { derived }
            | PropertyTarget::CompoundColumn { derived, .. } => {
                self.derived_columns(*derived, resolved.member_path(), None)
            }
        }
    }

    fn derived_columns(
        &self,
        derived: NodeId,
        members: &[String],
        prefix: Option<&str>,
    ) -> CodegenResult<Vec<String>> {
        let names = self
            .output_names(derived)
            .ok_or(CodegenError::MissingAlias(derived))?;
        let names = if members.is_empty() {
            names
        } else {
            let layout = self
                .tree
                .type_info(derived)
                .and_then(|ty| ty.member_path(members))
                .ok_or_else(|| CodegenError::UnresolvedProperty(members.join(".")))?;
            names
                .get(layout.columns)
                .ok_or(CodegenError::MissingAlias(derived))?
                .to_vec()
        };
        Ok(names.iter().map(|name| qualified(prefix, name)).collect())
    }

    /// Qualifier for columns of a range. Targets of UPDATE, INSERT and DELETE
    /// are referenced unqualified.
    fn range_prefix(&self, range: NodeId) -> Option<&'a str> {
        let tree = self.tree;
        let in_dml = tree
            .parent(range)
            .is_some_and(|p| matches!(tree.kind(p), Exp::Update | Exp::Insert | Exp::Delete));
        match tree.kind(range) {
            Exp::ClassName(class) if !in_dml => Some(class.display_name()),
            Exp::SubqueryRef { alias } => alias.as_deref(),
            _ => None,
        }
    }

    fn boolean(&mut self, id: NodeId, op: BooleanOperator) -> CodegenResult<String> {
        let tree = self.tree;
        let lhs = self.child(id, 0)?;
        let rhs = self.child(id, 1)?;
        match op {
            BooleanOperator::And | BooleanOperator::Or => Ok(format!(
                "{} {} {}",
                self.predicate(lhs)?,
                op.keyword(),
                self.predicate(rhs)?
            )),
            BooleanOperator::In | BooleanOperator::NotIn => self.in_predicate(lhs, rhs, op),
            BooleanOperator::Between | BooleanOperator::NotBetween => {
                let value = self.scalar(lhs)?;
                let lower = self.scalar(self.child(rhs, 0)?)?;
                let upper = self.scalar(self.child(rhs, 1)?)?;
                Ok(format!("{value} {} {lower} AND {upper}", op.keyword()))
            }
            BooleanOperator::Like | BooleanOperator::NotLike => {
                let value = self.scalar(lhs)?;
                if matches!(tree.kind(rhs), Exp::LikeEscape) {
                    let pattern = self.scalar(self.child(rhs, 0)?)?;
                    let escape = self.scalar(self.child(rhs, 1)?)?;
                    Ok(format!("{value} {} {pattern} ESCAPE {escape}", op.keyword()))
                } else {
                    Ok(format!("{value} {} {}", op.keyword(), self.scalar(rhs)?))
                }
            }
            _ => {
                let left = self.value(lhs)?;
                let right = self.value(rhs)?;
                let parts: Vec<String> = pair_columns(left, right, "comparison")?
                    .into_iter()
                    .map(|(l, r)| format!("{l} {} {r}", op.keyword()))
                    .collect();
                let connective = if op.is_negative() { " OR " } else { " AND " };
                Ok(combine(parts, connective))
            }
        }
    }

    fn in_predicate(&mut self, lhs: NodeId, rhs: NodeId, op: BooleanOperator) -> CodegenResult<String> {
        let tree = self.tree;
        let left = self.value(lhs)?;
        if !matches!(tree.kind(rhs), Exp::ValueList) {
            let [value] = left.as_slice() else {
                return Err(CodegenError::ColumnCountMismatch {
                    left: left.len(),
                    right: 1,
                    context: "IN subquery".to_string(),
                });
            };
            return Ok(format!("{value} {} {}", op.keyword(), self.scalar(rhs)?));
        }

        let items = self.list(rhs, |r, item| r.value(item))?;
        if left.len() == 1 {
            let items: Vec<String> = items.into_iter().flatten().collect();
            return Ok(format!("{} {} ({})", left[0], op.keyword(), items.join(", ")));
        }

        let mut alternatives = Vec::new();
        for item in items {
            let parts: Vec<String> = pair_columns(left.clone(), item, "IN list")?
                .into_iter()
                .map(|(l, r)| format!("{l} = {r}"))
                .collect();
            alternatives.push(combine(parts, " AND "));
        }
        let any = format!("({})", alternatives.join(" OR "));
        if op == BooleanOperator::NotIn {
            Ok(format!("NOT {any}"))
        } else {
            Ok(any)
        }
    }

    fn function_call(&mut self, id: NodeId, call: &FunctionCall) -> CodegenResult<String> {
        let mut out = format!("{}(", call.name);
        let quantifier = call.quantifier.keyword();
        if !quantifier.is_empty() {
            out.push_str(quantifier);
            out.push(' ');
        }
        if call.star {
            out.push('*');
        } else {
            let args = self.list(id, |r, arg| r.value(arg))?;
            out.push_str(&args.concat().join(", "));
        }
        out.push(')');
        Ok(out)
    }

    fn window_function(&mut self, id: NodeId, function: &WindowFunction) -> CodegenResult<String> {
        let call = self.scalar(self.child(id, 0)?)?;
        match (&function.window_name, self.tree.child(id, 1)) {
            (Some(name), _) => Ok(format!("{call} OVER {name}")),
            (None, Some(spec)) => Ok(format!("{call} OVER ({})", self.window_spec(spec)?)),
            (None, None) => Ok(format!("{call} OVER ()")),
        }
    }

    fn window_spec(&mut self, id: NodeId) -> CodegenResult<String> {
        let tree = self.tree;
        let Exp::WindowSpec { base } = tree.kind(id) else {
            return Err(CodegenError::unexpected("window", tree.kind(id).kind_name()));
        };
        let mut parts: Vec<String> = base.iter().cloned().collect();
        for &part in tree.children(id) {
            match tree.kind(part) {
                Exp::WindowPartition => {
                    let keys = self.list(part, |r, key| r.value(key))?;
                    parts.push(format!("PARTITION BY {}", keys.concat().join(", ")));
                }
                Exp::OrderBy => parts.push(format!("ORDER BY {}", self.order_by(part)?)),
                Exp::WindowFrame(frame) => parts.push(self.frame(part, frame)?),
                other => return Err(CodegenError::unexpected("window", other.kind_name())),
            }
        }
        Ok(parts.join(" "))
    }

    fn frame(&mut self, id: NodeId, frame: &WindowFrame) -> CodegenResult<String> {
        let offsets = self.list(id, |r, offset| r.scalar(offset))?;
        let mut offsets = offsets.into_iter();
        let mut render_bound = |bound: FrameBound| -> CodegenResult<String> {
            if bound.has_offset() {
                let offset = offsets
                    .next()
                    .ok_or_else(|| CodegenError::unexpected("window frame", "missing offset"))?;
                Ok(format!("{offset} {}", bound.keyword()))
            } else {
                Ok(bound.keyword().to_string())
            }
        };
        let start = render_bound(frame.start)?;
        Ok(match frame.end {
            Some(end) => format!("{} BETWEEN {start} AND {}", frame.units.keyword(), render_bound(end)?),
            None => format!("{} {start}", frame.units.keyword()),
        })
    }

    fn order_by(&mut self, id: NodeId) -> CodegenResult<String> {
        let tree = self.tree;
        let mut keys = Vec::new();
        for &spec in tree.children(id) {
            let Exp::OrderBySpec(direction) = tree.kind(spec) else {
                return Err(CodegenError::unexpected("ORDER BY", tree.kind(spec).kind_name()));
            };
            for snippet in self.value(self.child(spec, 0)?)? {
                let direction = direction.keyword();
                if direction.is_empty() {
                    keys.push(snippet);
                } else {
                    keys.push(format!("{snippet} {direction}"));
                }
            }
        }
        Ok(keys.join(", "))
    }

    /// Render every child of `id` with `render`
    fn list<T>(
        &mut self,
        id: NodeId,
        mut render: impl FnMut(&mut Self, NodeId) -> CodegenResult<T>,
    ) -> CodegenResult<Vec<T>> {
        let tree = self.tree;
        tree.children(id).iter().map(|&child| render(self, child)).collect()
    }

    fn child(&self, id: NodeId, index: usize) -> CodegenResult<NodeId> {
        self.tree
            .child(id, index)
            .ok_or_else(|| CodegenError::unexpected(self.tree.kind(id).kind_name(), "missing operand"))
    }
}

fn literal_sql(literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(value) => (if *value { "1" } else { "0" }).to_string(),
        Literal::Long(value) => value.to_string(),
        Literal::Double(value) => format!("{value:?}"),
        Literal::String(value) => quote_string(value),
        Literal::DateTime { value, .. } => format!("JULIANDAY({})", quote_string(value)),
    }
}

fn qualified(prefix: Option<&str>, column: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", quote_identifier(prefix), quote_identifier(column)),
        None => quote_identifier(column),
    }
}

fn only_filter(prefix: Option<&str>, map: &ClassMap) -> String {
    let column = quote_identifier(map.class_id_column());
    match prefix {
        Some(prefix) => format!("{prefix}.{column} = {}", map.id),
        None => format!("{column} = {}", map.id),
    }
}

fn system_column<'m>(map: &'m ClassMap, name: &'m str) -> &'m str {
    map.find_property(name)
        .and_then(|p| p.columns.first())
        .map_or(name, String::as_str)
}

/// Pair up columns of two operands, repeating a single-column side
fn pair_columns(
    left: Vec<String>,
    right: Vec<String>,
    context: &str,
) -> CodegenResult<Vec<(String, String)>> {
    match (left.len(), right.len()) {
        (l, r) if l == r => Ok(left.into_iter().zip(right).collect()),
        (_, 1) => Ok(left.into_iter().map(|l| (l, right[0].clone())).collect()),
        (1, _) => Ok(right.into_iter().map(|r| (left[0].clone(), r)).collect()),
        (l, r) => Err(CodegenError::ColumnCountMismatch {
            left: l,
            right: r,
            context: context.to_string(),
        }),
    }
}

fn combine(parts: Vec<String>, connective: &str) -> String {
    if parts.len() == 1 {
        parts.concat()
    } else {
        format!("({})", parts.join(connective))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_names("K0", 1), vec!["K0"]);
        assert_eq!(column_names("pt", 3), vec!["pt_0", "pt_1", "pt_2"]);
    }

    #[test]
    fn test_pair_columns_broadcasts_single_side() {
        let pairs = pair_columns(
            vec!["[a].[P_X]".into(), "[a].[P_Y]".into()],
            vec!["NULL".into()],
            "comparison",
        )
        .unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ("[a].[P_Y]".to_string(), "NULL".to_string()));

        let err = pair_columns(vec!["a".into(), "b".into()], vec!["c".into(); 3], "x").unwrap_err();
        assert!(matches!(err, CodegenError::ColumnCountMismatch { left: 2, right: 3, .. }));
    }

    #[test]
    fn test_literal_sql() {
        assert_eq!(literal_sql(&Literal::Boolean(true)), "1");
        assert_eq!(
            literal_sql(&Literal::DateTime {
                kind: ecsql_ir::DateTimeKind::Timestamp,
                value: "2020-01-01T00:00:00".into()
            }),
            "JULIANDAY('2020-01-01T00:00:00')"
        );
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(vec!["a = 1".into()], " AND "), "a = 1");
        assert_eq!(
            combine(vec!["a = 1".into(), "b = 2".into()], " OR "),
            "(a = 1 OR b = 2)"
        );
    }
}
