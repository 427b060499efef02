// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Class-map metadata
//!
//! These types describe how EC classes map onto backing tables. They are
//! produced by the class-map repository (see the catalog crate) and consumed
//! by semantic analysis and native SQL generation.
//!
//! A [`ClassMap`] owns an ordered list of [`PropertyMap`]s. Each property lists
//! the backing columns it occupies in the order given by
//! [`TypeInfo::column_count`]. Every class carries the system properties
//! `ECInstanceId` and `ECClassId`; link-table relationships additionally carry
//! `SourceECInstanceId`, `SourceECClassId`, `TargetECInstanceId` and
//! `TargetECClassId`.

use crate::types::{PrimitiveType, TypeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ECINSTANCEID: &str = "ECInstanceId";
pub const ECCLASSID: &str = "ECClassId";
pub const SOURCE_ECINSTANCEID: &str = "SourceECInstanceId";
pub const SOURCE_ECCLASSID: &str = "SourceECClassId";
pub const TARGET_ECINSTANCEID: &str = "TargetECInstanceId";
pub const TARGET_ECCLASSID: &str = "TargetECClassId";

/// Fully qualified class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassKey {
    pub schema: String,
    pub name: String,
}

impl ClassKey {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive identity check
    pub fn same_as(&self, other: &ClassKey) -> bool {
        self.schema.eq_ignore_ascii_case(&other.schema) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Class kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Entity,
    Relationship,
}

/// Mapping of one property onto backing columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    pub name: String,
    pub type_info: TypeInfo,
    /// Backing columns in layout order
    pub columns: Vec<String>,
    /// System properties resolve normally but are excluded from `*`
    pub system: bool,
}

impl PropertyMap {
    /// Create a property with default column names derived from its layout
    pub fn new(name: impl Into<String>, type_info: TypeInfo) -> Self {
        let name = name.into();
        let columns = default_columns(&name, &type_info);
        Self {
            name,
            type_info,
            columns,
            system: false,
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveType) -> Self {
        Self::new(name, TypeInfo::primitive(kind))
    }

    pub(crate) fn system(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_info: TypeInfo::long(),
            columns: vec![name.to_string()],
            system: true,
        }
    }

    /// Builder method: override the backing columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}

fn default_columns(name: &str, type_info: &TypeInfo) -> Vec<String> {
    match type_info {
        TypeInfo::Primitive(kind) if kind.is_point() => ["X", "Y", "Z"]
            .iter()
            .take(kind.column_count())
            .map(|axis| format!("{name}_{axis}"))
            .collect(),
        TypeInfo::Navigation { .. } => vec![format!("{name}_Id"), format!("{name}_RelECClassId")],
        TypeInfo::Struct(s) => s
            .members
            .iter()
            .flat_map(|m| default_columns(&format!("{name}_{}", m.name), &m.type_info))
            .collect(),
        _ => vec![name.to_string()],
    }
}

/// One end of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConstraint {
    pub classes: Vec<ClassKey>,
    pub polymorphic: bool,
    /// The end accepts instances of any class
    #[serde(default)]
    pub any_class: bool,
}

impl RelationshipConstraint {
    pub fn new(classes: Vec<ClassKey>, polymorphic: bool) -> Self {
        Self {
            classes,
            polymorphic,
            any_class: false,
        }
    }

    pub fn any_class() -> Self {
        Self {
            classes: Vec::new(),
            polymorphic: true,
            any_class: true,
        }
    }
}

/// Relationship ends of a relationship class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipMap {
    pub source: RelationshipConstraint,
    pub target: RelationshipConstraint,
}

/// Mapping of one EC class onto its backing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMap {
    /// Value of the `ECClassId` column for instances of exactly this class
    pub id: u64,
    pub key: ClassKey,
    pub kind: ClassKind,
    pub table: String,
    pub base_class: Option<ClassKey>,
    pub properties: Vec<PropertyMap>,
    pub relationship: Option<RelationshipMap>,
}

impl ClassMap {
    /// Create an entity class carrying the `ECInstanceId`/`ECClassId` system properties
    pub fn entity(id: u64, key: ClassKey, table: impl Into<String>) -> Self {
        Self {
            id,
            key,
            kind: ClassKind::Entity,
            table: table.into(),
            base_class: None,
            properties: vec![PropertyMap::system(ECINSTANCEID), PropertyMap::system(ECCLASSID)],
            relationship: None,
        }
    }

    /// Create a link-table relationship class
    pub fn relationship(
        id: u64,
        key: ClassKey,
        table: impl Into<String>,
        source: RelationshipConstraint,
        target: RelationshipConstraint,
    ) -> Self {
        let mut class = Self::entity(id, key, table);
        class.kind = ClassKind::Relationship;
        class.properties.extend(
            [
                SOURCE_ECINSTANCEID,
                SOURCE_ECCLASSID,
                TARGET_ECINSTANCEID,
                TARGET_ECCLASSID,
            ]
            .into_iter()
            .map(PropertyMap::system),
        );
        class.relationship = Some(RelationshipMap { source, target });
        class
    }

    /// Builder method: append a property
    pub fn with_property(mut self, property: PropertyMap) -> Self {
        self.properties.push(property);
        self
    }

    /// Builder method: set the base class
    pub fn with_base_class(mut self, base: ClassKey) -> Self {
        self.base_class = Some(base);
        self
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == ClassKind::Relationship
    }

    /// Case-insensitive property lookup, system properties included
    pub fn find_property(&self, name: &str) -> Option<&PropertyMap> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Properties that `*` expands to, in declaration order
    pub fn visible_properties(&self) -> impl Iterator<Item = &PropertyMap> {
        self.properties.iter().filter(|p| !p.system)
    }

    /// The `ECClassId` column of the backing table
    pub fn class_id_column(&self) -> &str {
        self.find_property(ECCLASSID)
            .and_then(|p| p.columns.first())
            .map(String::as_str)
            .unwrap_or(ECCLASSID)
    }

    /// The `ECInstanceId` column of the backing table
    pub fn instance_id_column(&self) -> &str {
        self.find_property(ECINSTANCEID)
            .and_then(|p| p.columns.first())
            .map(String::as_str)
            .unwrap_or(ECINSTANCEID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructType;

    #[test]
    fn test_entity_has_system_properties() {
        let class = ClassMap::entity(10, ClassKey::new("ecsql", "P"), "ecsql_P");
        assert!(class.find_property("ecinstanceid").unwrap().system);
        assert!(class.find_property("ECClassId").is_some());
        assert_eq!(class.visible_properties().count(), 0);
        assert_eq!(class.instance_id_column(), "ECInstanceId");
    }

    #[test]
    fn test_relationship_system_properties() {
        let rel = ClassMap::relationship(
            20,
            ClassKey::new("ecsql", "PSAHasP"),
            "ecsql_PSAHasP",
            RelationshipConstraint::new(vec![ClassKey::new("ecsql", "PSA")], false),
            RelationshipConstraint::new(vec![ClassKey::new("ecsql", "P")], true),
        );
        assert!(rel.is_relationship());
        assert!(rel.find_property(SOURCE_ECINSTANCEID).is_some());
        assert!(rel.find_property(TARGET_ECCLASSID).is_some());
    }

    #[test]
    fn test_default_columns() {
        let point = PropertyMap::primitive("P3D", PrimitiveType::Point3d);
        assert_eq!(point.columns, vec!["P3D_X", "P3D_Y", "P3D_Z"]);

        let nav = PropertyMap::new("Parent", TypeInfo::navigation("P"));
        assert_eq!(nav.columns, vec!["Parent_Id", "Parent_RelECClassId"]);

        let st = StructType::new("S")
            .with_member("I", TypeInfo::long())
            .with_member("P2D", TypeInfo::primitive(PrimitiveType::Point2d));
        let prop = PropertyMap::new("PStructProp", TypeInfo::Struct(st));
        assert_eq!(
            prop.columns,
            vec!["PStructProp_I", "PStructProp_P2D_X", "PStructProp_P2D_Y"]
        );
        assert_eq!(prop.columns.len(), prop.type_info.column_count());
    }

    #[test]
    fn test_class_key_same_as() {
        assert!(ClassKey::new("ECSQL", "psa").same_as(&ClassKey::new("ecsql", "PSA")));
        assert!(!ClassKey::new("ecsql", "PSA").same_as(&ClassKey::new("ecsql", "P")));
    }
}
