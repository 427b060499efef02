// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Schema fixtures
//!
//! Test schemas are written in a compact YAML form and turned into class maps
//! here. The standard `ecsql` schema ships with the crate.

use ecsql_ir::{
    ClassKey, ClassMap, PrimitiveType, PropertyMap, RelationshipConstraint, StructType, TypeInfo,
};
use serde::Deserialize;
use std::collections::HashMap;

/// YAML source of the standard `ecsql` test schema
pub const STANDARD_SCHEMA: &str = include_str!("../fixtures/ecsql_schema.yaml");

/// Errors raised while loading a schema fixture
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Invalid schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown struct '{0}'")]
    UnknownStruct(String),
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    schema: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    structs: Vec<StructDef>,
    #[serde(default)]
    classes: Vec<ClassDef>,
    #[serde(default)]
    relationships: Vec<RelationshipDef>,
}

#[derive(Debug, Deserialize)]
struct StructDef {
    name: String,
    members: Vec<PropertyDef>,
}

#[derive(Debug, Deserialize)]
struct ClassDef {
    name: String,
    id: u64,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyDef>,
}

#[derive(Debug, Deserialize)]
struct RelationshipDef {
    name: String,
    id: u64,
    #[serde(default)]
    table: Option<String>,
    source: ConstraintDef,
    target: ConstraintDef,
}

#[derive(Debug, Deserialize)]
struct ConstraintDef {
    classes: Vec<String>,
    #[serde(default = "polymorphic_default")]
    polymorphic: bool,
}

fn polymorphic_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PropertyDef {
    name: String,
    #[serde(flatten)]
    kind: PropertyKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PropertyKind {
    Primitive(PrimitiveType),
    Array(PrimitiveType),
    Struct(String),
    StructArray(String),
    Navigation(String),
}

/// Struct definitions resolved so far, by name
struct StructTable {
    structs: HashMap<String, StructType>,
}

impl StructTable {
    fn get(&self, name: &str) -> Result<StructType, FixtureError> {
        self.structs
            .get(name)
            .cloned()
            .ok_or_else(|| FixtureError::UnknownStruct(name.to_string()))
    }

    fn type_of(&self, kind: &PropertyKind) -> Result<TypeInfo, FixtureError> {
        Ok(match kind {
            PropertyKind::Primitive(p) => TypeInfo::Primitive(*p),
            PropertyKind::Array(p) => TypeInfo::PrimitiveArray(*p),
            PropertyKind::Struct(name) => TypeInfo::Struct(self.get(name)?),
            PropertyKind::StructArray(name) => TypeInfo::StructArray(self.get(name)?),
            PropertyKind::Navigation(class) => TypeInfo::navigation(class.as_str()),
        })
    }
}

/// Parse a YAML schema fixture into class maps
///
/// Structs must be declared before the structs and classes that use them.
pub fn load_classes(yaml: &str) -> Result<(Option<(String, String)>, Vec<ClassMap>), FixtureError> {
    let document: SchemaDocument = serde_yaml::from_str(yaml)?;
    let schema = document.schema.as_str();
    let key = |name: &str| ClassKey::new(schema, name);
    let table = |name: &str, explicit: &Option<String>| {
        explicit.clone().unwrap_or_else(|| format!("{schema}_{name}"))
    };

    let mut structs = StructTable {
        structs: HashMap::new(),
    };
    for def in &document.structs {
        let mut struct_type = StructType::new(def.name.as_str());
        for member in &def.members {
            struct_type = struct_type.with_member(member.name.as_str(), structs.type_of(&member.kind)?);
        }
        structs.structs.insert(def.name.clone(), struct_type);
    }

    let mut classes = Vec::new();
    for def in &document.classes {
        let mut class = ClassMap::entity(def.id, key(&def.name), table(&def.name, &def.table));
        if let Some(base) = &def.base {
            class = class.with_base_class(key(base));
        }
        for property in &def.properties {
            class = class.with_property(PropertyMap::new(
                property.name.as_str(),
                structs.type_of(&property.kind)?,
            ));
        }
        classes.push(class);
    }

    let constraint = |def: &ConstraintDef| {
        RelationshipConstraint::new(def.classes.iter().map(|c| key(c)).collect(), def.polymorphic)
    };
    for def in &document.relationships {
        classes.push(ClassMap::relationship(
            def.id,
            key(&def.name),
            table(&def.name, &def.table),
            constraint(&def.source),
            constraint(&def.target),
        ));
    }

    let alias = document
        .alias
        .map(|alias| (alias, document.schema.clone()));
    Ok((alias, classes))
}
