// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Diagnostics sink
//!
//! Issues collected while analyzing one statement. Analysis stops at the first
//! error, so a failed analysis normally carries exactly one error issue.

use crate::error::SemanticError;
use serde::Serialize;
use std::fmt;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Coarse grouping of issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCategory {
    NameResolution,
    TypeSystem,
    RelationshipJoin,
    ClauseShape,
    Limits,
    Repository,
    Codegen,
    Internal,
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: IssueCategory,
    /// Stable code, e.g. `AmbiguousProperty`
    pub code: String,
    pub message: String,
    /// Canonical ECSQL text of the offending expression, when it could be rendered
    pub expression: Option<String>,
}

impl Issue {
    pub fn error(category: IssueCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            code: code.into(),
            message: message.into(),
            expression: None,
        }
    }

    /// Builder method: attach the offending expression text
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&SemanticError> for Issue {
    fn from(err: &SemanticError) -> Self {
        Issue::error(err.category(), err.code(), err.to_string())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(expression) = &self.expression {
            write!(f, " (in '{expression}')")?;
        }
        Ok(())
    }
}

/// Ordered list of issues
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    issues: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn first_error(&self) -> Option<&Issue> {
        self.issues.iter().find(|i| i.is_error())
    }

    /// Whether any issue carries `code`
    pub fn contains_code(&self, code: &str) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_from_error() {
        let err = SemanticError::UnknownProperty("Foo".into());
        let issue = Issue::from(&err).with_expression("a.Foo");
        assert_eq!(issue.code, "UnknownProperty");
        assert_eq!(issue.category, IssueCategory::NameResolution);
        assert!(issue.is_error());
        assert_eq!(
            issue.to_string(),
            "[UnknownProperty] Property not found: Foo (in 'a.Foo')"
        );
    }

    #[test]
    fn test_diagnostics_queries() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_errors());
        diagnostics.push(Issue {
            severity: Severity::Warning,
            category: IssueCategory::Internal,
            code: "Note".into(),
            message: "note".into(),
            expression: None,
        });
        assert!(!diagnostics.has_errors());
        diagnostics.push(Issue::error(IssueCategory::TypeSystem, "TypeMismatch", "bad"));
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.first_error().map(|i| i.code.as_str()), Some("TypeMismatch"));
        assert!(diagnostics.contains_code("Note"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_serializes_to_json() {
        let issue = Issue::error(IssueCategory::Codegen, "MissingAlias", "no alias");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["category"], "Codegen");
        assert_eq!(json["severity"], "Error");
        assert!(json["expression"].is_null());
    }
}
