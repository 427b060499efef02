// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Relationship joins
//!
//! `A JOIN B USING R [FORWARD|BACKWARD]` links the joined class `B` to one
//! earlier range `A` of the same FROM clause through the relationship `R`.
//! Analysis decides which range plays `R`'s source end and which its target
//! end:
//!
//! - `FORWARD`: `B` is the target, `A` the source
//! - `BACKWARD`: `B` is the source, `A` the target
//! - no direction: whichever assignment the constraints allow. When `B` fits
//!   both ends, the other candidate must fit exactly one of them.

use crate::context::{ConstraintClasses, ResolutionContext};
use crate::error::{SemanticError, SemanticResult};
use crate::symbol::RangeClassInfo;
use ecsql_ir::{ClassMap, Exp, ExpTree, JoinDirection, NodeId, RelationshipEnds};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fix the ends of a `RelationshipJoin` node and record them on it
///
/// `ranges` are the local ranges of the enclosing FROM clause.
#[instrument(skip(tree, ctx, ranges))]
pub fn resolve_relationship_join(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    join: NodeId,
    ranges: &[RangeClassInfo],
) -> SemanticResult<RelationshipEnds> {
    let Exp::RelationshipJoin(payload) = tree.kind(join) else {
        return Err(SemanticError::MissingJoinDirection(
            tree.kind(join).kind_name().to_string(),
        ));
    };
    let direction = payload.direction;
    let (Some(to), Some(rel)) = (tree.child(join, 1), tree.child(join, 2)) else {
        return Err(SemanticError::MissingJoinDirection(
            "incomplete relationship join".to_string(),
        ));
    };

    let relationship = class_of(tree, rel)?;
    let joined = class_of(tree, to)?;
    let (source, target) = ctx.relationship_constraints(&relationship)?;
    let sources = ctx.constraint_classes(&source)?;
    let targets = ctx.constraint_classes(&target)?;

    let joined_is_source = sources.contains(&joined);
    let joined_is_target = targets.contains(&joined);
    if !joined_is_source && !joined_is_target {
        return Err(not_related(&joined, &relationship));
    }

    let candidates: Vec<(NodeId, Arc<ClassMap>)> = ranges
        .iter()
        .filter(|r| r.node != to && r.node != rel)
        .filter_map(|r| r.class_map().map(|c| (r.node, Arc::clone(c))))
        .collect();

    let ends = match direction {
        JoinDirection::Forward => {
            if !joined_is_target {
                return Err(invalid_direction(&relationship, &joined, "FORWARD"));
            }
            let other = single_end(&candidates, &sources, &relationship)?;
            RelationshipEnds { source: other, target: to }
        }
        JoinDirection::Backward => {
            if !joined_is_source {
                return Err(invalid_direction(&relationship, &joined, "BACKWARD"));
            }
            let other = single_end(&candidates, &targets, &relationship)?;
            RelationshipEnds { source: to, target: other }
        }
        JoinDirection::Implied => match (joined_is_source, joined_is_target) {
            (true, true) => implied_both(&candidates, &sources, &targets, &relationship, to)?,
            (false, true) => RelationshipEnds {
                source: single_end(&candidates, &sources, &relationship)?,
                target: to,
            },
            _ => RelationshipEnds {
                source: to,
                target: single_end(&candidates, &targets, &relationship)?,
            },
        },
    };

    if let Exp::RelationshipJoin(payload) = tree.kind_mut(join) {
        payload.resolved = Some(ends);
    }
    debug!(source = %ends.source, target = %ends.target, "resolved relationship join");
    Ok(ends)
}

fn class_of(tree: &ExpTree, node: NodeId) -> SemanticResult<Arc<ClassMap>> {
    tree.kind(node)
        .as_class_name()
        .and_then(|c| c.class_map())
        .cloned()
        .ok_or_else(|| SemanticError::UnknownClass(tree.kind(node).kind_name().to_string()))
}

/// The one candidate eligible for `end`
fn single_end(
    candidates: &[(NodeId, Arc<ClassMap>)],
    end: &ConstraintClasses,
    relationship: &ClassMap,
) -> SemanticResult<NodeId> {
    let eligible: Vec<&(NodeId, Arc<ClassMap>)> =
        candidates.iter().filter(|(_, c)| end.contains(c)).collect();
    match eligible.as_slice() {
        [(node, _)] => Ok(*node),
        [] => Err(SemanticError::NotRelated {
            class: candidates
                .iter()
                .map(|(_, c)| c.key.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            relationship: relationship.key.to_string(),
        }),
        many => Err(SemanticError::AmbiguousEnd {
            relationship: relationship.key.to_string(),
            candidates: many.iter().map(|(_, c)| c.key.to_string()).collect(),
        }),
    }
}

/// No direction and the joined class fits both ends
fn implied_both(
    candidates: &[(NodeId, Arc<ClassMap>)],
    sources: &ConstraintClasses,
    targets: &ConstraintClasses,
    relationship: &ClassMap,
    to: NodeId,
) -> SemanticResult<RelationshipEnds> {
    let eligible: Vec<&(NodeId, Arc<ClassMap>)> = candidates
        .iter()
        .filter(|(_, c)| sources.contains(c) || targets.contains(c))
        .collect();
    let (other, class) = match eligible.as_slice() {
        [single] => (single.0, &single.1),
        [] => {
            return Err(SemanticError::NotRelated {
                class: String::new(),
                relationship: relationship.key.to_string(),
            });
        }
        many => {
            return Err(SemanticError::AmbiguousEnd {
                relationship: relationship.key.to_string(),
                candidates: many.iter().map(|(_, c)| c.key.to_string()).collect(),
            });
        }
    };
    match (sources.contains(class), targets.contains(class)) {
        (true, true) => Err(SemanticError::MissingJoinDirection(relationship.key.to_string())),
        (true, false) => Ok(RelationshipEnds { source: other, target: to }),
        _ => Ok(RelationshipEnds { source: to, target: other }),
    }
}

fn not_related(class: &ClassMap, relationship: &ClassMap) -> SemanticError {
    SemanticError::NotRelated {
        class: class.key.to_string(),
        relationship: relationship.key.to_string(),
    }
}

fn invalid_direction(relationship: &ClassMap, class: &ClassMap, direction: &str) -> SemanticError {
    SemanticError::InvalidJoinDirection {
        relationship: relationship.key.to_string(),
        class: class.key.to_string(),
        direction: direction.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ecsql_ir::{ClassNameRef, ClassRefTarget};

    struct Fixture {
        tree: ExpTree,
        ctx: ResolutionContext,
        ranges: Vec<RangeClassInfo>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: ExpTree::new(),
                ctx: testing::context(),
                ranges: Vec::new(),
            }
        }

        fn class(&mut self, name: &str) -> NodeId {
            let class = self.ctx.resolve_class(Some("ecsql"), name).unwrap();
            let mut reference = ClassNameRef::new(Some("ecsql"), name);
            reference.resolved = Some(ClassRefTarget::Class(class));
            let node = self.tree.class_name(reference);
            self.ranges.push(RangeClassInfo::from_node(&self.tree, node).unwrap());
            node
        }

        fn join(&mut self, from: &str, to: &str, rel: &str, direction: JoinDirection) -> (NodeId, NodeId, SemanticResult<RelationshipEnds>) {
            let from = self.class(from);
            let to = self.class(to);
            let rel = self.class(rel);
            let join = self.tree.relationship_join(from, to, rel, direction);
            let ends = resolve_relationship_join(&mut self.tree, &mut self.ctx, join, &self.ranges);
            (from, to, ends)
        }
    }

    #[test]
    fn test_implied_direction_from_constraints() {
        let mut f = Fixture::new();
        let (from, to, ends) = f.join("PSA", "P", "PSAHasP", JoinDirection::Implied);
        assert_eq!(ends.unwrap(), RelationshipEnds { source: from, target: to });

        let mut f = Fixture::new();
        let (from, to, ends) = f.join("P", "PSA", "PSAHasP", JoinDirection::Implied);
        assert_eq!(ends.unwrap(), RelationshipEnds { source: to, target: from });
    }

    #[test]
    fn test_resolved_ends_are_recorded() {
        let mut f = Fixture::new();
        let from = f.class("PSA");
        let to = f.class("P");
        let rel = f.class("PSAHasP");
        let join = f.tree.relationship_join(from, to, rel, JoinDirection::Forward);
        resolve_relationship_join(&mut f.tree, &mut f.ctx, join, &f.ranges).unwrap();
        match f.tree.kind(join) {
            Exp::RelationshipJoin(j) => assert_eq!(j.resolved, Some(RelationshipEnds { source: from, target: to })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_self_join_requires_direction() {
        let mut f = Fixture::new();
        let (_, _, ends) = f.join("PSA", "PSA", "PSAHasPSA", JoinDirection::Implied);
        assert_eq!(ends.unwrap_err().code(), "MissingJoinDirection");

        let mut f = Fixture::new();
        let (from, to, ends) = f.join("PSA", "PSA", "PSAHasPSA", JoinDirection::Backward);
        assert_eq!(ends.unwrap(), RelationshipEnds { source: to, target: from });
    }

    #[test]
    fn test_direction_contradicting_constraints() {
        let mut f = Fixture::new();
        let (_, _, ends) = f.join("PSA", "P", "PSAHasP", JoinDirection::Backward);
        assert_eq!(ends.unwrap_err().code(), "InvalidJoinDirection");
    }

    #[test]
    fn test_unrelated_class() {
        let mut f = Fixture::new();
        let (_, _, ends) = f.join("P", "P", "PSAHasPSA", JoinDirection::Implied);
        assert_eq!(ends.unwrap_err().code(), "NotRelated");
    }

    #[test]
    fn test_polymorphic_end_accepts_subclass() {
        let mut f = Fixture::new();
        let (from, to, ends) = f.join("SubPSA", "P", "PSAHasP", JoinDirection::Forward);
        assert_eq!(ends.unwrap(), RelationshipEnds { source: from, target: to });
    }

    #[test]
    fn test_two_candidates_are_ambiguous() {
        let mut f = Fixture::new();
        f.class("SubPSA");
        let (_, _, ends) = f.join("PSA", "P", "PSAHasP", JoinDirection::Forward);
        assert_eq!(ends.unwrap_err().code(), "AmbiguousEnd");
    }
}
