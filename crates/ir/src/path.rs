// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Property paths
//!
//! A [`PropertyPath`] is the dotted reference as written (`a.StructProp.Member`).
//! Once resolved, the owning [`PropertyName`](crate::expr::PropertyName) node
//! keeps both the original path and a [`ResolvedProperty`], whose own path is
//! relative to the matched range class (a leading alias is stripped).

use crate::metadata::ClassMap;
use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Ordered list of path components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// Split a dotted path. `"*"` and `"a.*"` are wildcard paths.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(|s| s.trim().to_string()).collect())
    }

    pub fn from_parts(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Path without its first `n` components
    pub fn skip(&self, n: usize) -> PropertyPath {
        Self(self.0.iter().skip(n).cloned().collect())
    }

    pub fn is_wildcard(&self) -> bool {
        self.last() == Some("*")
    }

    /// `a` for `a.*`, `None` for a lone `*`
    pub fn wildcard_qualifier(&self) -> Option<&str> {
        if self.is_wildcard() && self.0.len() == 2 {
            self.first()
        } else {
            None
        }
    }

    /// Case-insensitive component-wise equality
    pub fn same_as(&self, other: &PropertyPath) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Visibility of a range class from the statement being finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeScope {
    /// Declared in the current statement
    Local,
    /// Declared by an enclosing statement
    Inherited,
}

/// What a resolved property refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyTarget {
    /// A property owned by a class
    Class { class: Arc<ClassMap>, property: String },
    /// An output column of a subquery or CTE: the derived property node inside it
    Derived { derived: NodeId },
    /// A SELECT-list alias of the same statement
    SelectAlias { derived: NodeId },
    /// A result column of a compound SELECT; `derived` is the leftmost branch's item
    CompoundColumn { position: usize, derived: NodeId },
}

/// Resolution result stored on a property name node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProperty {
    /// Range class (or derived property, for alias matches) that owns the match
    pub range: NodeId,
    pub scope: RangeScope,
    /// Path relative to `range`; the first component names the property or column
    pub path: PropertyPath,
    pub target: PropertyTarget,
}

impl ResolvedProperty {
    /// Member accesses following the property or column name
    pub fn member_path(&self) -> &[String] {
        self.path.parts().get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = PropertyPath::parse("a.PStructProp.i");
        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some("a"));
        assert_eq!(path.skip(1).to_string(), "PStructProp.i");
    }

    #[test]
    fn test_wildcards() {
        assert!(PropertyPath::parse("*").is_wildcard());
        assert_eq!(PropertyPath::parse("*").wildcard_qualifier(), None);
        assert_eq!(PropertyPath::parse("psa.*").wildcard_qualifier(), Some("psa"));
        assert!(!PropertyPath::parse("psa.I").is_wildcard());
    }

    #[test]
    fn test_same_as_ignores_case() {
        assert!(PropertyPath::parse("A.i").same_as(&PropertyPath::parse("a.I")));
        assert!(!PropertyPath::parse("a.I").same_as(&PropertyPath::parse("I")));
    }
}
