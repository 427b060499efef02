// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Canonical ECSQL renderer
//!
//! Reproduces statement text from a tree. Names render as written, so the
//! renderer works on unresolved trees too; the analyzer uses it to quote the
//! offending expression in diagnostics. Wildcards render expanded once the
//! SELECT list has been finalized.

use crate::error::{CodegenError, CodegenResult};
use crate::tokens::{Keyword, push_keyword, quote_string};
use ecsql_ir::{DateTimeKind, Exp, ExpTree, FrameBound, Literal, NodeId, WindowFrame};

/// Render the subtree rooted at `id` as ECSQL text
pub fn render_ecsql(tree: &ExpTree, id: NodeId) -> CodegenResult<String> {
    EcsqlRenderer::new(tree).render(id)
}

/// Canonical text renderer over one tree
#[derive(Debug, Clone, Copy)]
pub struct EcsqlRenderer<'a> {
    tree: &'a ExpTree,
}

impl<'a> EcsqlRenderer<'a> {
    pub fn new(tree: &'a ExpTree) -> Self {
        Self { tree }
    }

    pub fn render(&self, id: NodeId) -> CodegenResult<String> {
        let text = self.render_bare(id)?;
        let parenthesized = self.tree.node(id).has_parentheses()
            && !matches!(self.tree.kind(id), Exp::Subquery | Exp::ValueList);
        if parenthesized {
            Ok(format!("({text})"))
        } else {
            Ok(text)
        }
    }

    fn render_bare(&self, id: NodeId) -> CodegenResult<String> {
        let tree = self.tree;
        let text = match tree.kind(id) {
            Exp::SelectStatement(compound) => {
                let mut out = self.render(self.child(id, 0)?)?;
                if let (Some(operator), Some(rest)) = (compound.operator, tree.child(id, 1)) {
                    push_keyword(&mut out, &operator);
                    if compound.all {
                        out.push_str(" ALL");
                    }
                    out.push(' ');
                    out.push_str(&self.render(rest)?);
                }
                out
            }
            Exp::SingleSelect(quantifier) => {
                let mut out = String::from("SELECT");
                push_keyword(&mut out, quantifier);
                for &clause in tree.children(id) {
                    out.push(' ');
                    out.push_str(&self.render(clause)?);
                }
                out
            }
            Exp::CommonTable { recursive } => {
                let (statement, blocks) = tree
                    .children(id)
                    .split_last()
                    .ok_or_else(|| CodegenError::unexpected("WITH", "empty clause"))?;
                let mut out = String::from("WITH");
                if *recursive {
                    out.push_str(" RECURSIVE");
                }
                out.push(' ');
                out.push_str(&self.join(blocks, ", ")?);
                out.push(' ');
                out.push_str(&self.render(*statement)?);
                out
            }
            Exp::CommonTableBlock(block) => {
                let mut out = block.name.clone();
                if !block.columns.is_empty() {
                    out.push_str(&format!("({})", block.columns.join(", ")));
                }
                format!("{out} AS ({})", self.render(self.child(id, 0)?)?)
            }
            Exp::Insert => {
                let mut out = String::from("INSERT INTO");
                for &part in tree.children(id) {
                    if matches!(tree.kind(part), Exp::ValueList) {
                        out.push_str(" VALUES");
                    }
                    out.push(' ');
                    out.push_str(&self.render(part)?);
                }
                out
            }
            Exp::Update => {
                let mut out = String::from("UPDATE");
                for &part in tree.children(id) {
                    out.push(' ');
                    out.push_str(&self.render(part)?);
                }
                out
            }
            Exp::Delete => {
                let mut out = String::from("DELETE FROM");
                for &part in tree.children(id) {
                    out.push(' ');
                    out.push_str(&self.render(part)?);
                }
                out
            }
            Exp::Selection => self.join(tree.children(id), ", ")?,
            Exp::DerivedProperty(derived) => {
                let value = self.render(self.child(id, 0)?)?;
                match &derived.alias {
                    Some(alias) => format!("{value} AS {alias}"),
                    None => value,
                }
            }
            Exp::From => format!("FROM {}", self.join(tree.children(id), ", ")?),
            Exp::ClassName(class) => {
                let mut out = String::new();
                if !class.polymorphic {
                    out.push_str("ONLY ");
                }
                if let Some(schema) = &class.schema {
                    out.push_str(schema);
                    out.push('.');
                }
                out.push_str(&class.name);
                if let Some(alias) = &class.alias {
                    out.push(' ');
                    out.push_str(alias);
                }
                out
            }
            Exp::SubqueryRef { alias } => {
                let subquery = self.render(self.child(id, 0)?)?;
                match alias {
                    Some(alias) => format!("{subquery} {alias}"),
                    None => subquery,
                }
            }
            Exp::Join(kind) => {
                let mut out = format!(
                    "{} {} {}",
                    self.render(self.child(id, 0)?)?,
                    kind.keyword(),
                    self.render(self.child(id, 1)?)?
                );
                if let Some(on) = tree.child(id, 2) {
                    out.push_str(" ON ");
                    out.push_str(&self.render(on)?);
                }
                out
            }
            Exp::RelationshipJoin(join) => {
                let mut out = format!(
                    "{} JOIN {} USING {}",
                    self.render(self.child(id, 0)?)?,
                    self.render(self.child(id, 1)?)?,
                    self.render(self.child(id, 2)?)?
                );
                push_keyword(&mut out, &join.direction);
                out
            }
            Exp::Where => format!("WHERE {}", self.render(self.child(id, 0)?)?),
            Exp::GroupBy => format!("GROUP BY {}", self.join(tree.children(id), ", ")?),
            Exp::Having => format!("HAVING {}", self.render(self.child(id, 0)?)?),
            Exp::OrderBy => format!("ORDER BY {}", self.join(tree.children(id), ", ")?),
            Exp::OrderBySpec(direction) => {
                let mut out = self.render(self.child(id, 0)?)?;
                push_keyword(&mut out, direction);
                out
            }
            Exp::LimitOffset => {
                let mut out = format!("LIMIT {}", self.render(self.child(id, 0)?)?);
                if let Some(offset) = tree.child(id, 1) {
                    out.push_str(" OFFSET ");
                    out.push_str(&self.render(offset)?);
                }
                out
            }
            Exp::AssignmentList => format!("SET {}", self.join(tree.children(id), ", ")?),
            Exp::Assignment => format!(
                "{} = {}",
                self.render(self.child(id, 0)?)?,
                self.render(self.child(id, 1)?)?
            ),
            Exp::PropertyNameList | Exp::ValueList => {
                format!("({})", self.join(tree.children(id), ", ")?)
            }
            Exp::Options(entries) => {
                let mut out = String::from("ECSQLOPTIONS");
                for entry in entries {
                    out.push(' ');
                    out.push_str(&entry.name);
                    if let Some(value) = &entry.value {
                        out.push('=');
                        out.push_str(value);
                    }
                }
                out
            }
            Exp::WindowClause => format!("WINDOW {}", self.join(tree.children(id), ", ")?),
            Exp::NamedWindow { name } => {
                format!("{name} AS ({})", self.render(self.child(id, 0)?)?)
            }
            Exp::WindowSpec { base } => {
                let mut parts: Vec<String> = base.iter().cloned().collect();
                for &part in tree.children(id) {
                    parts.push(self.render(part)?);
                }
                parts.join(" ")
            }
            Exp::WindowPartition => {
                format!("PARTITION BY {}", self.join(tree.children(id), ", ")?)
            }
            Exp::WindowFrame(frame) => self.frame(id, frame)?,
            Exp::WindowFunction(function) => {
                let call = self.render(self.child(id, 0)?)?;
                match (&function.window_name, tree.child(id, 1)) {
                    (Some(name), _) => format!("{call} OVER {name}"),
                    (None, Some(spec)) => format!("{call} OVER ({})", self.render(spec)?),
                    (None, None) => format!("{call} OVER ()"),
                }
            }
            Exp::BinaryBoolean(op) => format!(
                "{} {} {}",
                self.render(self.child(id, 0)?)?,
                op.keyword(),
                self.render(self.child(id, 1)?)?
            ),
            Exp::Not => format!("NOT {}", self.render(self.child(id, 0)?)?),
            Exp::BinaryValue(op) => format!(
                "{} {} {}",
                self.render(self.child(id, 0)?)?,
                op.keyword(),
                self.render(self.child(id, 1)?)?
            ),
            Exp::UnaryValue(op) => format!("{}{}", op.keyword(), self.render(self.child(id, 0)?)?),
            Exp::Literal(literal) => literal_text(literal),
            Exp::Parameter(parameter) => match &parameter.name {
                Some(name) => format!(":{name}"),
                None => "?".to_string(),
            },
            Exp::PropertyName(property) => property.path.to_string(),
            Exp::FunctionCall(call) => {
                let mut out = format!("{}(", call.name);
                let quantifier = call.quantifier.keyword();
                if !quantifier.is_empty() {
                    out.push_str(quantifier);
                    out.push(' ');
                }
                if call.star {
                    out.push('*');
                } else {
                    out.push_str(&self.join(tree.children(id), ", ")?);
                }
                out.push(')');
                out
            }
            Exp::Cast(target) => format!(
                "CAST({} AS {})",
                self.render(self.child(id, 0)?)?,
                target.ecsql_name()
            ),
            Exp::BetweenRange => format!(
                "{} AND {}",
                self.render(self.child(id, 0)?)?,
                self.render(self.child(id, 1)?)?
            ),
            Exp::LikeEscape => format!(
                "{} ESCAPE {}",
                self.render(self.child(id, 0)?)?,
                self.render(self.child(id, 1)?)?
            ),
            Exp::Subquery => format!("({})", self.render(self.child(id, 0)?)?),
            Exp::Exists => format!("EXISTS {}", self.render(self.child(id, 0)?)?),
        };
        Ok(text)
    }

    fn frame(&self, id: NodeId, frame: &WindowFrame) -> CodegenResult<String> {
        let mut offsets = self.tree.children(id).iter();
        let mut render_bound = |bound: FrameBound| -> CodegenResult<String> {
            if bound.has_offset() {
                let offset = offsets
                    .next()
                    .ok_or_else(|| CodegenError::unexpected("window frame", "missing offset"))?;
                Ok(format!("{} {}", self.render(*offset)?, bound.keyword()))
            } else {
                Ok(bound.keyword().to_string())
            }
        };
        let start = render_bound(frame.start)?;
        Ok(match frame.end {
            Some(end) => format!(
                "{} BETWEEN {start} AND {}",
                frame.units.keyword(),
                render_bound(end)?
            ),
            None => format!("{} {start}", frame.units.keyword()),
        })
    }

    fn child(&self, id: NodeId, index: usize) -> CodegenResult<NodeId> {
        self.tree
            .child(id, index)
            .ok_or_else(|| CodegenError::unexpected(self.tree.kind(id).kind_name(), "missing operand"))
    }

    fn join(&self, ids: &[NodeId], separator: &str) -> CodegenResult<String> {
        let parts = ids
            .iter()
            .map(|&id| self.render(id))
            .collect::<CodegenResult<Vec<_>>>()?;
        Ok(parts.join(separator))
    }
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(true) => "TRUE".to_string(),
        Literal::Boolean(false) => "FALSE".to_string(),
        Literal::Long(value) => value.to_string(),
        Literal::Double(value) => format!("{value:?}"),
        Literal::String(value) => quote_string(value),
        Literal::DateTime { kind, value } => {
            let keyword = match kind {
                DateTimeKind::Date => "DATE",
                DateTimeKind::Timestamp => "TIMESTAMP",
            };
            format!("{keyword} {}", quote_string(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsql_ir::{
        BooleanOperator, ClassNameRef, FunctionCall, JoinDirection, SelectClauses, SetQuantifier,
        SortDirection,
    };

    #[test]
    fn test_select_round_trips_as_written() {
        let mut tree = ExpTree::new();
        let i = tree.property("I");
        let item = tree.derived(i, Some("x"));
        let class = tree.class_name(ClassNameRef::new(Some("ecsql"), "PSA").with_alias("a"));
        let lhs = tree.property("a.S");
        let pattern = tree.literal(Literal::String("it's%".into()));
        let like = tree.like(lhs, pattern, None, false);
        let select = tree.single_select(
            SelectClauses::new(vec![item], vec![class])
                .with_quantifier(SetQuantifier::Distinct)
                .with_where(like),
        );
        let root = tree.select(select);

        assert_eq!(
            render_ecsql(&tree, root).unwrap(),
            "SELECT DISTINCT I AS x FROM ecsql.PSA a WHERE a.S LIKE 'it''s%'"
        );
    }

    #[test]
    fn test_parentheses_and_parameters() {
        let mut tree = ExpTree::new();
        let a = tree.property("I");
        let p1 = tree.parameter(Some("lo"));
        let gt = tree.boolean(a, BooleanOperator::Gt, p1);
        let b = tree.property("L");
        let p2 = tree.parameter(None);
        let eq = tree.boolean(b, BooleanOperator::Eq, p2);
        let or = tree.boolean(gt, BooleanOperator::Or, eq);
        tree.parenthesize(or);
        let c = tree.literal(Literal::Boolean(true));
        let and = tree.boolean(or, BooleanOperator::And, c);

        assert_eq!(
            render_ecsql(&tree, and).unwrap(),
            "(I > :lo OR L = ?) AND TRUE"
        );
    }

    #[test]
    fn test_relationship_join_and_order_by() {
        let mut tree = ExpTree::new();
        let star = tree.property("*");
        let item = tree.derived(star, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "PSA"));
        let to = tree.class_name(ClassNameRef::new(Some("ecsql"), "P").only());
        let rel = tree.class_name(ClassNameRef::new(Some("ecsql"), "PSAHasP"));
        let join = tree.relationship_join(from, to, rel, JoinDirection::Forward);
        let key = tree.property("I");
        let count = tree.function(FunctionCall::new("COUNT").with_star(), vec![]);
        let select = tree.single_select(
            SelectClauses::new(vec![item], vec![join])
                .with_order_by(vec![(key, SortDirection::Descending)]),
        );
        let root = tree.select(select);

        assert_eq!(
            render_ecsql(&tree, root).unwrap(),
            "SELECT * FROM ecsql.PSA JOIN ONLY ecsql.P USING ecsql.PSAHasP FORWARD ORDER BY I DESC"
        );
        assert_eq!(render_ecsql(&tree, count).unwrap(), "COUNT(*)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal_text(&Literal::Double(1.0)), "1.0");
        assert_eq!(
            literal_text(&Literal::DateTime {
                kind: DateTimeKind::Date,
                value: "2020-01-01".into()
            }),
            "DATE '2020-01-01'"
        );
        assert_eq!(literal_text(&Literal::Null), "NULL");
    }
}
