// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Type information
//!
//! Every value expression in an ECSQL tree resolves to a [`TypeInfo`]. The model
//! mirrors the EC schema layer rather than the storage engine:
//!
//! - **Primitives**: `Binary`, `Boolean`, `DateTime`, `Double`, `Integer`, `Long`,
//!   `String`, and the spatial kinds `Point2d`, `Point3d`, `Geometry`
//! - **Structs**: named member lists, nested to any depth
//! - **Arrays**: of primitives or of structs
//! - **Navigation**: a reference to a related class instance
//!
//! ## Column layout
//!
//! A single EC value can span several backing columns. A `Point3d` is stored as
//! `X`, `Y`, `Z`; a navigation value as `Id`, `RelECClassId`; a struct as the
//! concatenation of its members' columns. [`TypeInfo::column_count`] and
//! [`TypeInfo::member_path`] describe that layout so that member access such as
//! `Origin.X` or `Parent.Id` can be mapped to a sub-range of columns.
//!
//! ```text
//! struct Location { Origin: Point3d, Name: String }
//!
//! columns:  Origin_X  Origin_Y  Origin_Z  Name
//! index:    0         1         2         3
//!
//! member_path(["Origin", "Y"]) => Double, 1..2
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Primitive EC value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Binary,
    Boolean,
    DateTime,
    Double,
    Integer,
    Long,
    String,
    Point2d,
    Point3d,
    Geometry,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Double | Self::Integer | Self::Long)
    }

    pub fn is_point(self) -> bool {
        matches!(self, Self::Point2d | Self::Point3d)
    }

    /// Points and geometries
    pub fn is_spatial(self) -> bool {
        self.is_point() || self == Self::Geometry
    }

    /// Number of backing columns a value of this kind occupies
    pub fn column_count(self) -> usize {
        match self {
            Self::Point2d => 2,
            Self::Point3d => 3,
            _ => 1,
        }
    }

    /// ECSQL spelling, as used by `CAST(x AS <type>)`
    pub fn ecsql_name(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "DATETIME",
            Self::Double => "DOUBLE",
            Self::Integer => "INT",
            Self::Long => "LONG",
            Self::String => "STRING",
            Self::Point2d => "POINT2D",
            Self::Point3d => "POINT3D",
            Self::Geometry => "GEOMETRY",
        }
    }

    /// Storage type affinity used when casting in native SQL
    pub fn sql_affinity(self) -> &'static str {
        match self {
            Self::Binary | Self::Geometry => "BLOB",
            Self::Boolean | Self::Integer | Self::Long => "INTEGER",
            Self::DateTime | Self::Double => "REAL",
            Self::String => "TEXT",
            Self::Point2d | Self::Point3d => "REAL",
        }
    }

    /// Loose comparability between primitive kinds.
    ///
    /// The backing engine is dynamically typed, so all scalar kinds compare with
    /// each other, except that binaries only compare with binaries and strings.
    /// Spatial kinds only compare with the identical kind.
    pub fn can_compare(self, other: PrimitiveType) -> bool {
        use PrimitiveType::*;
        match (self, other) {
            (Point2d, Point2d) | (Point3d, Point3d) | (Geometry, Geometry) => true,
            (Point2d | Point3d | Geometry, _) | (_, Point2d | Point3d | Geometry) => false,
            (Binary, Binary | String) | (String, Binary) => true,
            (Binary, _) | (_, Binary) => false,
            _ => true,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Double => "Double",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::String => "String",
            Self::Point2d => "Point2d",
            Self::Point3d => "Point3d",
            Self::Geometry => "Geometry",
        };
        f.write_str(name)
    }
}

/// A named struct type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    pub members: Vec<StructMember>,
}

/// A member of a [`StructType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructMember {
    pub name: String,
    pub type_info: TypeInfo,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Builder method: append a member
    pub fn with_member(mut self, name: impl Into<String>, type_info: TypeInfo) -> Self {
        self.members.push(StructMember {
            name: name.into(),
            type_info,
        });
        self
    }

    pub fn column_count(&self) -> usize {
        self.members.iter().map(|m| m.type_info.column_count()).sum()
    }

    /// True if any member, at any depth, is a struct array
    pub fn contains_struct_array(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.type_info.contains_struct_array())
    }
}

/// Resolved type of a value expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeInfo {
    /// The `NULL` literal
    Null,
    Primitive(PrimitiveType),
    Struct(StructType),
    PrimitiveArray(PrimitiveType),
    StructArray(StructType),
    Navigation {
        related_class: String,
    },
    /// Value lists, before their elements are checked one by one
    Varies,
    /// Parameters no syntactic context could type, and functions unknown to
    /// the registry
    Unconstrained,
}

/// Result of a member lookup: the member type and the columns it occupies
/// relative to the owning value
#[derive(Debug, Clone, PartialEq)]
pub struct MemberLayout {
    pub type_info: TypeInfo,
    pub columns: Range<usize>,
}

impl TypeInfo {
    pub fn primitive(kind: PrimitiveType) -> Self {
        Self::Primitive(kind)
    }

    pub fn long() -> Self {
        Self::Primitive(PrimitiveType::Long)
    }

    pub fn double() -> Self {
        Self::Primitive(PrimitiveType::Double)
    }

    pub fn string() -> Self {
        Self::Primitive(PrimitiveType::String)
    }

    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveType::Boolean)
    }

    pub fn navigation(related_class: impl Into<String>) -> Self {
        Self::Navigation {
            related_class: related_class.into(),
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveType::is_numeric)
    }

    pub fn is_spatial(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveType::is_spatial)
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation { .. })
    }

    /// Types that carry no static information
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Null | Self::Varies | Self::Unconstrained)
    }

    /// True for struct arrays and for structs nesting one at any depth
    pub fn contains_struct_array(&self) -> bool {
        match self {
            Self::StructArray(_) => true,
            Self::Struct(s) => s.contains_struct_array(),
            _ => false,
        }
    }

    /// Types restricted to the equality operator family in predicates
    pub fn is_equality_only(&self) -> bool {
        match self {
            Self::Primitive(kind) => kind.is_spatial(),
            Self::Navigation { .. } | Self::PrimitiveArray(_) | Self::Struct(_) => true,
            _ => false,
        }
    }

    /// Number of backing columns a value of this type occupies
    pub fn column_count(&self) -> usize {
        match self {
            Self::Primitive(kind) => kind.column_count(),
            Self::Struct(s) => s.column_count(),
            Self::Navigation { .. } => 2,
            _ => 1,
        }
    }

    /// Looks up a direct member. Points expose `X`, `Y`, `Z`; navigation values
    /// expose `Id` and `RelECClassId`; structs expose their members.
    pub fn member(&self, name: &str) -> Option<MemberLayout> {
        match self {
            Self::Primitive(kind) if kind.is_point() => {
                let index = ["X", "Y", "Z"]
                    .iter()
                    .take(kind.column_count())
                    .position(|axis| axis.eq_ignore_ascii_case(name))?;
                Some(MemberLayout {
                    type_info: TypeInfo::double(),
                    columns: index..index + 1,
                })
            }
            Self::Navigation { .. } => {
                let index = ["Id", "RelECClassId"]
                    .iter()
                    .position(|m| m.eq_ignore_ascii_case(name))?;
                Some(MemberLayout {
                    type_info: TypeInfo::long(),
                    columns: index..index + 1,
                })
            }
            Self::Struct(s) => {
                let mut offset = 0;
                for member in &s.members {
                    let width = member.type_info.column_count();
                    if member.name.eq_ignore_ascii_case(name) {
                        return Some(MemberLayout {
                            type_info: member.type_info.clone(),
                            columns: offset..offset + width,
                        });
                    }
                    offset += width;
                }
                None
            }
            _ => None,
        }
    }

    /// Resolves a chain of member accesses. An empty chain yields the whole value.
    pub fn member_path<S: AsRef<str>>(&self, names: &[S]) -> Option<MemberLayout> {
        let mut layout = MemberLayout {
            type_info: self.clone(),
            columns: 0..self.column_count(),
        };
        for name in names {
            let inner = layout.type_info.member(name.as_ref())?;
            let start = layout.columns.start + inner.columns.start;
            layout = MemberLayout {
                columns: start..start + inner.columns.len(),
                type_info: inner.type_info,
            };
        }
        Some(layout)
    }

    /// General comparability used by the type checker.
    ///
    /// Open types compare with anything. Otherwise the kinds must agree:
    /// compatible primitive families, structs of the same name, arrays of
    /// comparable elements, or two navigation values.
    pub fn can_compare(&self, other: &TypeInfo) -> bool {
        match (self, other) {
            (a, b) if a.is_open() || b.is_open() => true,
            (Self::Primitive(a), Self::Primitive(b)) => a.can_compare(*b),
            (Self::Struct(a), Self::Struct(b)) | (Self::StructArray(a), Self::StructArray(b)) => {
                a.name.eq_ignore_ascii_case(&b.name)
            }
            (Self::PrimitiveArray(a), Self::PrimitiveArray(b)) => a.can_compare(*b),
            (Self::Navigation { .. }, Self::Navigation { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Struct(s) => write!(f, "struct {}", s.name),
            Self::PrimitiveArray(kind) => write!(f, "array of {kind}"),
            Self::StructArray(s) => write!(f, "array of struct {}", s.name),
            Self::Navigation { related_class } => write!(f, "navigation to {related_class}"),
            Self::Varies => f.write_str("varies"),
            Self::Unconstrained => f.write_str("unconstrained"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> StructType {
        StructType::new("Location")
            .with_member("Origin", TypeInfo::primitive(PrimitiveType::Point3d))
            .with_member("Name", TypeInfo::string())
    }

    #[test]
    fn test_column_count() {
        assert_eq!(TypeInfo::long().column_count(), 1);
        assert_eq!(TypeInfo::primitive(PrimitiveType::Point2d).column_count(), 2);
        assert_eq!(TypeInfo::navigation("P").column_count(), 2);
        assert_eq!(TypeInfo::Struct(location()).column_count(), 4);
        assert_eq!(TypeInfo::StructArray(location()).column_count(), 1);
    }

    #[test]
    fn test_member_path_layout() {
        let ty = TypeInfo::Struct(location());
        let layout = ty.member_path(&["Origin", "Y"]).unwrap();
        assert_eq!(layout.type_info, TypeInfo::double());
        assert_eq!(layout.columns, 1..2);

        let name = ty.member_path(&["name"]).unwrap();
        assert_eq!(name.columns, 3..4);

        assert!(ty.member_path(&["Origin", "W"]).is_none());
        assert!(TypeInfo::long().member_path(&["X"]).is_none());
    }

    #[test]
    fn test_point2d_has_no_z() {
        let p = TypeInfo::primitive(PrimitiveType::Point2d);
        assert!(p.member("X").is_some());
        assert!(p.member("Z").is_none());
    }

    #[test]
    fn test_navigation_members() {
        let nav = TypeInfo::navigation("P");
        assert_eq!(nav.member("RelECClassId").unwrap().columns, 1..2);
        assert_eq!(nav.member("id").unwrap().type_info, TypeInfo::long());
    }

    #[test]
    fn test_nested_struct_array_detection() {
        let inner = StructType::new("Inner").with_member("I", TypeInfo::long());
        let outer = StructType::new("Outer")
            .with_member("Items", TypeInfo::StructArray(inner.clone()))
            .with_member("L", TypeInfo::long());
        let wrapper = StructType::new("Wrapper").with_member("O", TypeInfo::Struct(outer));

        assert!(TypeInfo::Struct(wrapper).contains_struct_array());
        assert!(!TypeInfo::Struct(inner.clone()).contains_struct_array());
        assert!(TypeInfo::StructArray(inner).contains_struct_array());
    }

    #[test]
    fn test_can_compare() {
        use PrimitiveType::*;
        assert!(TypeInfo::long().can_compare(&TypeInfo::double()));
        assert!(TypeInfo::string().can_compare(&TypeInfo::primitive(DateTime)));
        assert!(!TypeInfo::primitive(Binary).can_compare(&TypeInfo::long()));
        assert!(!TypeInfo::primitive(Point2d).can_compare(&TypeInfo::primitive(Point3d)));
        assert!(TypeInfo::navigation("A").can_compare(&TypeInfo::navigation("B")));
        assert!(!TypeInfo::navigation("A").can_compare(&TypeInfo::long()));
        assert!(TypeInfo::Null.can_compare(&TypeInfo::Struct(location())));
        assert!(!TypeInfo::Struct(location()).can_compare(&TypeInfo::PrimitiveArray(Long)));
    }

    #[test]
    fn test_equality_only_types() {
        assert!(TypeInfo::primitive(PrimitiveType::Geometry).is_equality_only());
        assert!(TypeInfo::Struct(location()).is_equality_only());
        assert!(TypeInfo::PrimitiveArray(PrimitiveType::Long).is_equality_only());
        assert!(!TypeInfo::long().is_equality_only());
        assert!(!TypeInfo::StructArray(location()).is_equality_only());
    }
}
