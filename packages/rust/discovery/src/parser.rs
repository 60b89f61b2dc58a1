//! Multi-document YAML parser and typed views over resource specs.
//!
//! A source file holds one or more `---`-separated documents. Each document
//! becomes a [`Resource`]; its `spec` is read lazily through
//! [`PipelineSpec`] / [`TaskSpec`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use tracing::{debug, warn};

use pipeviz_shared::{PipevizError, Resource, Result, scalar_to_string};

// ---------------------------------------------------------------------------
// Document parsing
// ---------------------------------------------------------------------------

/// Parse every document in `content` into a [`Resource`].
///
/// Empty documents are skipped. Any malformed document fails the whole
/// input, so callers skip the file rather than render half of it.
pub fn parse_documents(content: &str) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document).map_err(|e| PipevizError::parse(e.to_string()))?;
        if value.is_null() {
            continue;
        }

        let resource: Resource =
            serde_yaml::from_value(value).map_err(|e| PipevizError::parse(e.to_string()))?;
        resources.push(resource);
    }

    debug!(documents = resources.len(), "parsed YAML documents");
    Ok(resources)
}

// ---------------------------------------------------------------------------
// Typed spec views
// ---------------------------------------------------------------------------

/// `spec` of a `Pipeline`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSpec {
    #[serde(deserialize_with = "lenient_list")]
    pub params: Vec<ParamSpec>,
    #[serde(deserialize_with = "lenient_list")]
    pub workspaces: Vec<WorkspaceDecl>,
    #[serde(deserialize_with = "lenient_list")]
    pub tasks: Vec<PipelineTask>,
    #[serde(deserialize_with = "lenient_list")]
    pub finally: Vec<PipelineTask>,
}

/// `spec` of a `Task`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskSpec {
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub params: Vec<ParamSpec>,
    #[serde(deserialize_with = "lenient_list")]
    pub workspaces: Vec<WorkspaceDecl>,
    #[serde(deserialize_with = "lenient_list")]
    pub steps: Vec<Step>,
    #[serde(deserialize_with = "lenient_list")]
    pub results: Vec<ResultDecl>,
}

/// A declared parameter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParamSpec {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub param_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    pub default: Option<Value>,
}

/// A declared workspace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceDecl {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    pub optional: bool,
}

/// A task invocation inside a pipeline's `tasks` or `finally`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineTask {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub task_ref: Option<TaskRef>,
    #[serde(deserialize_with = "lenient_list")]
    pub run_after: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub params: Vec<ParamValue>,
    #[serde(deserialize_with = "lenient_list")]
    pub workspaces: Vec<WorkspaceBinding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskRef {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// A parameter value passed to a pipeline task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParamValue {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    pub value: Option<Value>,
}

/// Maps a task workspace onto a pipeline workspace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceBinding {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub workspace: Option<String>,
}

/// One container step of a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Step {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub command: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub args: Vec<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub script: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub env: Vec<EnvVar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvVar {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    pub value: Option<Value>,
}

/// A declared task result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResultDecl {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

impl PipelineSpec {
    /// Read a pipeline spec. Mistyped fields fall back to their defaults;
    /// a spec that is not a mapping renders as empty.
    pub fn from_resource(resource: &Resource) -> Self {
        typed_view(resource, "pipeline")
    }
}

impl TaskSpec {
    /// Read a task spec, with the same leniency as [`PipelineSpec`].
    pub fn from_resource(resource: &Resource) -> Self {
        typed_view(resource, "task")
    }
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

// A mistyped field degrades to its default instead of failing the whole view.

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| scalar_to_string(&value)))
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_yaml::from_value(value)
        .map_err(|e| warn!(error = %e, "ignoring malformed field"))
        .ok())
}

/// Accepts a list or a single item; entries that do not fit are dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        single => vec![single],
    };

    Ok(items
        .into_iter()
        .filter_map(|item| {
            serde_yaml::from_value(item)
                .map_err(|e| warn!(error = %e, "ignoring malformed list entry"))
                .ok()
        })
        .collect())
}

fn typed_view<T: Default + for<'de> Deserialize<'de>>(resource: &Resource, what: &str) -> T {
    if resource.spec.is_null() {
        return T::default();
    }
    serde_yaml::from_value(resource.spec.clone()).unwrap_or_else(|e| {
        warn!(name = resource.name(), error = %e, "malformed {what} spec, rendering empty");
        T::default()
    })
}
