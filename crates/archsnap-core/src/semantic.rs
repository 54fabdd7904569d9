//! Input records describing an architecture.
//!
//! These are the already-decoded records handed to the graph model builder:
//! [`ComponentSpec`], [`GroupSpec`] and [`RelationshipSpec`], collected in an
//! [`ArchitectureSpec`]. Tags are kept as raw strings here so that an unknown
//! tag is reported by the builder together with the record that carries it;
//! [`Category`] and [`RelationKind`] are the recognized tag sets.
//!
//! # Example
//!
//! ```
//! use archsnap_core::semantic::{ArchitectureSpec, ComponentSpec, RelationshipSpec};
//!
//! let spec = ArchitectureSpec::new()
//!     .with_component(ComponentSpec::new("api", "service"))
//!     .with_component(ComponentSpec::new("db", "database").with_weight(2.0))
//!     .with_relationship(RelationshipSpec::new("api", "db", "sync-call"));
//!
//! assert_eq!(spec.components.len(), 2);
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A tag that is not part of a recognized tag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {set} tag `{tag}`")]
pub struct UnknownTag {
    /// Name of the tag set, e.g. `category`.
    pub set: &'static str,
    /// The offending tag text.
    pub tag: String,
}

/// Classification of a component, controlling its default shape and style.
///
/// Deserializes from its tag text, so it can key configuration tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Service,
    Database,
    Queue,
    Cache,
    External,
    Client,
}

impl Category {
    /// Every recognized category, in tag order.
    pub const ALL: [Category; 6] = [
        Category::Service,
        Category::Database,
        Category::Queue,
        Category::Cache,
        Category::External,
        Category::Client,
    ];

    /// The tag text for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Service => "service",
            Category::Database => "database",
            Category::Queue => "queue",
            Category::Cache => "cache",
            Category::External => "external",
            Category::Client => "client",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownTag {
                set: "category",
                tag: s.to_string(),
            })
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a relationship between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    SyncCall,
    AsyncMessage,
    DataFlow,
}

impl RelationKind {
    /// Every recognized relationship kind, in tag order.
    pub const ALL: [RelationKind; 3] = [
        RelationKind::SyncCall,
        RelationKind::AsyncMessage,
        RelationKind::DataFlow,
    ];

    /// The tag text for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::SyncCall => "sync-call",
            RelationKind::AsyncMessage => "async-message",
            RelationKind::DataFlow => "data-flow",
        }
    }
}

impl FromStr for RelationKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTag {
                set: "relationship kind",
                tag: s.to_string(),
            })
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Identifier, unique across components and groups.
    pub id: String,
    /// Display label; the identifier is used when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Category tag, one of [`Category`].
    pub category: String,
    /// Geometry scale factor, clamped by the synthesizer.
    #[serde(default)]
    pub weight: Option<f32>,
    /// Group the component belongs to.
    #[serde(default)]
    pub group: Option<String>,
}

impl ComponentSpec {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            category: category.into(),
            weight: None,
            group: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A group record: a named, possibly nested, collection of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Component identifiers contained directly in this group.
    #[serde(default)]
    pub members: Vec<String>,
    /// Enclosing group, if this group is nested.
    #[serde(default)]
    pub parent: Option<String>,
}

impl GroupSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            members: Vec::new(),
            parent: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// A directed relationship record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub source: String,
    pub target: String,
    /// Kind tag, one of [`RelationKind`].
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl RelationshipSpec {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A complete architecture description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub relationships: Vec<RelationshipSpec>,
}

impl ArchitectureSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipSpec) -> Self {
        self.relationships.push(relationship);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_tag() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_unknown_category() {
        let err = "mainframe".parse::<Category>().unwrap_err();
        assert_eq!(err.tag, "mainframe");
        assert_eq!(err.to_string(), "unrecognized category tag `mainframe`");
    }

    #[test]
    fn test_relation_kind_tags() {
        assert_eq!("sync-call".parse(), Ok(RelationKind::SyncCall));
        assert_eq!("async-message".parse(), Ok(RelationKind::AsyncMessage));
        assert_eq!("data-flow".parse(), Ok(RelationKind::DataFlow));
        assert!("SYNC-CALL".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_architecture_from_toml() {
        let text = r#"
            [[components]]
            id = "api"
            category = "service"
            group = "backend"

            [[components]]
            id = "db"
            label = "Orders DB"
            category = "database"
            weight = 1.5

            [[groups]]
            id = "backend"
            members = ["db"]

            [[relationships]]
            source = "api"
            target = "db"
            kind = "sync-call"
        "#;

        let spec: ArchitectureSpec = toml::from_str(text).expect("valid architecture");
        assert_eq!(spec.components.len(), 2);
        assert_eq!(spec.components[0].group.as_deref(), Some("backend"));
        assert_eq!(spec.components[1].weight, Some(1.5));
        assert_eq!(spec.groups[0].members, ["db"]);
        assert_eq!(spec.relationships[0].kind, "sync-call");
        assert_eq!(spec.relationships[0].label, None);
    }
}
