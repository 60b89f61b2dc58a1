//! Core domain types: pipeline/task resources and the navigation tree.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Name used when a resource has no `metadata.name`.
pub const DEFAULT_RESOURCE_NAME: &str = "Unnamed Resource";

/// Label holding a resource's semantic version.
pub const VERSION_LABEL: &str = "app.kubernetes.io/version";

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The resource kinds pipeviz documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pipeline,
    Task,
    /// Anything else; rendered nowhere and kept out of the navigation.
    Other,
}

impl ResourceKind {
    /// Classify a document's `kind` field (case-insensitive).
    pub fn from_kind_str(kind: &str) -> Self {
        if kind.eq_ignore_ascii_case("pipeline") {
            Self::Pipeline
        } else if kind.eq_ignore_ascii_case("task") {
            Self::Task
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeline => write!(f, "pipeline"),
            Self::Task => write!(f, "task"),
            Self::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// One YAML document: a Tekton-style `Pipeline`, `Task`, or something else.
///
/// `spec` stays an untyped tree; renderers pull typed views out of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Raw `kind` field as written in the document.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: serde_yaml::Value,
}

/// `metadata` block of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Label values are kept as YAML scalars; unquoted versions parse as numbers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, serde_yaml::Value>,
}

impl Resource {
    /// Classified kind.
    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::from_kind_str(&self.kind)
    }

    /// `metadata.name`, or [`DEFAULT_RESOURCE_NAME`].
    pub fn name(&self) -> &str {
        self.metadata
            .name
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_NAME)
    }

    /// The [`VERSION_LABEL`] value rendered as a string, or `""`.
    pub fn version(&self) -> String {
        self.metadata
            .labels
            .get(VERSION_LABEL)
            .map(scalar_to_string)
            .unwrap_or_default()
    }
}

/// Render a YAML scalar the way it was most likely written.
pub fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Navigation tree
// ---------------------------------------------------------------------------

/// A navigation tree: the top-level sequence of an mkdocs `nav`.
pub type Nav = Vec<NavNode>;

/// One entry of an mkdocs navigation tree.
///
/// Serializes to the mkdocs shapes: `"path"`, `{label: path}` and
/// `{label: [children]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNavNode")]
pub enum NavNode {
    /// Unlabeled page reference.
    Page(String),
    /// Labeled link to a page.
    Leaf { label: String, path: String },
    /// Labeled sub-list (a section or group).
    Branch { label: String, children: Vec<NavNode> },
}

impl NavNode {
    pub fn leaf(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Leaf {
            label: label.into(),
            path: path.into(),
        }
    }

    pub fn branch(label: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self::Branch {
            label: label.into(),
            children,
        }
    }

    /// The entry's label; `None` for bare pages.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Page(_) => None,
            Self::Leaf { label, .. } | Self::Branch { label, .. } => Some(label),
        }
    }

    /// Children of a branch with the given label.
    pub fn children_if_branch(&self, wanted: &str) -> Option<&[NavNode]> {
        match self {
            Self::Branch { label, children } if label == wanted => Some(children),
            _ => None,
        }
    }
}

impl Serialize for NavNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Page(path) => serializer.serialize_str(path),
            Self::Leaf { label, path } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(label, path)?;
                map.end()
            }
            Self::Branch { label, children } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(label, children)?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNavNode {
    Page(String),
    Entry(BTreeMap<String, RawNavValue>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNavValue {
    Path(String),
    Children(Vec<NavNode>),
}

impl TryFrom<RawNavNode> for NavNode {
    type Error = String;

    fn try_from(raw: RawNavNode) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawNavNode::Page(path) => Ok(Self::Page(path)),
            RawNavNode::Entry(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "nav entry must have exactly one key, found {}",
                        map.len()
                    ));
                }
                let Some((label, value)) = map.into_iter().next() else {
                    return Err("empty nav entry".to_string());
                };
                Ok(match value {
                    RawNavValue::Path(path) => Self::Leaf { label, path },
                    RawNavValue::Children(children) => Self::Branch { label, children },
                })
            }
        }
    }
}
