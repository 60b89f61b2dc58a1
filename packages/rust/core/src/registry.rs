//! Version registry: every discovered version of every resource, by group.
//!
//! The registry is append-only and keeps discovery order at every level.
//! Version ordering is applied later, when the navigation is emitted.

use indexmap::IndexMap;
use tracing::trace;

use pipeviz_shared::ResourceKind;

use crate::grouping::{GroupingOffset, group_path};

/// One discovered version of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Raw version label; empty when the resource has none.
    pub version: String,
    /// Generated page path.
    pub path: String,
}

impl VersionEntry {
    pub fn new(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
        }
    }
}

/// Resources of one name within a group.
pub type ResourceVersions = IndexMap<String, Vec<VersionEntry>>;

/// `group path -> resource name -> versions`, all in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    groups: IndexMap<String, ResourceVersions>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version of `name` under `group`.
    pub fn record(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
    ) {
        let entry = VersionEntry::new(version, path);
        let group = group.into();
        let name = name.into();
        trace!(group = %group, name = %name, version = %entry.version, "recording version");

        self.groups
            .entry(group)
            .or_default()
            .entry(name)
            .or_default()
            .push(entry);
    }

    /// Snapshot of every group, in the order groups were first seen.
    pub fn groups(&self) -> &IndexMap<String, ResourceVersions> {
        &self.groups
    }

    /// Versions recorded for `name` under `group`, in discovery order.
    pub fn get(&self, group: &str, name: &str) -> Option<&[VersionEntry]> {
        self.groups
            .get(group)
            .and_then(|resources| resources.get(name))
            .map(Vec::as_slice)
    }

    /// Total number of recorded versions.
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .flat_map(IndexMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-kind grouping offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOffsets {
    pub pipelines: Option<GroupingOffset>,
    pub tasks: Option<GroupingOffset>,
}

/// One registry per documented kind.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub pipelines: VersionRegistry,
    pub tasks: VersionRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a discovered resource under its kind's registry.
    ///
    /// The group path comes from `output_path` and the kind's offset.
    /// Returns `false` (and records nothing) for undocumented kinds.
    pub fn record_resource(
        &mut self,
        kind: ResourceKind,
        name: &str,
        version: &str,
        output_path: &str,
        offsets: &GroupingOffsets,
    ) -> bool {
        let (registry, offset) = match kind {
            ResourceKind::Pipeline => (&mut self.pipelines, offsets.pipelines),
            ResourceKind::Task => (&mut self.tasks, offsets.tasks),
            ResourceKind::Other => return false,
        };

        registry.record(group_path(output_path, offset), name, version, output_path);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty() && self.tasks.is_empty()
    }
}
