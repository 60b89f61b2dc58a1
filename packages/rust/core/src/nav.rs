//! Navigation tree assembly.
//!
//! Turns the version registries into mkdocs navigation sections:
//!
//! ```text
//! - Pipelines:
//!   - group1:
//!     - pipeline1: group1/pipelines/pipeline1.md
//!     - pipeline2:
//!       - pipeline2 v2.0: group1/pipelines/pipeline2-2.0.md
//!       - pipeline2 v1.0: group1/pipelines/pipeline2-1.0.md
//! - Tasks:
//!   - ...
//! ```
//!
//! The tree is extended in place. Sections may be pre-declared by the
//! caller as empty stubs (`- Pipelines: []`), and a second builder pass
//! over the same section adds to what the first one emitted.

use tracing::{debug, instrument, trace};

use pipeviz_discovery::{is_source_link, page_link_for};
use pipeviz_shared::{NavConfig, NavNode};

use crate::registry::{Registries, ResourceVersions, VersionEntry, VersionRegistry};
use crate::version::sort_descending;

/// Labels of the two top-level sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLabels {
    pub pipelines: String,
    pub tasks: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self::from(&NavConfig::default())
    }
}

impl From<&NavConfig> for SectionLabels {
    fn from(config: &NavConfig) -> Self {
        Self {
            pipelines: config.section_pipelines.clone(),
            tasks: config.section_tasks.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Add the pipelines section, then the tasks section, to `nav`.
#[instrument(skip_all, fields(pipelines = registries.pipelines.len(), tasks = registries.tasks.len()))]
pub fn update_navigation(nav: &mut Vec<NavNode>, registries: &Registries, labels: &SectionLabels) {
    let section = locate_or_create(nav, &labels.pipelines);
    populate_section(section, &registries.pipelines);

    let section = locate_or_create(nav, &labels.tasks);
    populate_section(section, &registries.tasks);
}

// ---------------------------------------------------------------------------
// Section locator
// ---------------------------------------------------------------------------

/// Find a pre-declared empty section named `label`, or append a new one.
///
/// The search is depth-first over the whole tree and only matches a branch
/// whose children are still empty; a same-named section that already has
/// content is left alone. A new section goes at the top level.
pub fn locate_or_create<'a>(nav: &'a mut Vec<NavNode>, label: &str) -> &'a mut Vec<NavNode> {
    let path = match empty_section_path(nav, label) {
        Some(path) => {
            trace!(section = label, depth = path.len(), "reusing declared section");
            path
        }
        None => {
            debug!(section = label, "creating nav section");
            nav.push(NavNode::branch(label, Vec::new()));
            vec![nav.len() - 1]
        }
    };

    let mut level = nav;
    for idx in path {
        level = branch_children(level, idx);
    }
    level
}

/// Index path to the first empty branch labeled `label`, depth-first.
fn empty_section_path(nodes: &[NavNode], label: &str) -> Option<Vec<usize>> {
    for (idx, node) in nodes.iter().enumerate() {
        let NavNode::Branch {
            label: node_label,
            children,
        } = node
        else {
            continue;
        };

        if node_label == label && children.is_empty() {
            return Some(vec![idx]);
        }
        if let Some(mut path) = empty_section_path(children, label) {
            path.insert(0, idx);
            return Some(path);
        }
    }
    None
}

/// Children of the branch at `idx`.
fn branch_children(level: &mut Vec<NavNode>, idx: usize) -> &mut Vec<NavNode> {
    match &mut level[idx] {
        NavNode::Branch { children, .. } => children,
        // callers only hand in indices they found or pushed as branches
        _ => unreachable!("nav index {idx} is not a branch"),
    }
}

// ---------------------------------------------------------------------------
// Tree builder
// ---------------------------------------------------------------------------

/// Emit every group of `registry` into `section`.
pub fn populate_section(section: &mut Vec<NavNode>, registry: &VersionRegistry) {
    for (group, resources) in registry.groups() {
        let level = group_level(section, group);
        append_resources(level, resources);
    }
}

/// Walk (creating as needed) the nested group branches for `group`.
///
/// At each level the first branch with the segment's label is reused.
fn group_level<'a>(section: &'a mut Vec<NavNode>, group: &str) -> &'a mut Vec<NavNode> {
    let mut level = section;
    for segment in group.split('/').filter(|s| !s.is_empty()) {
        let existing = level
            .iter()
            .position(|node| node.children_if_branch(segment).is_some());

        let idx = match existing {
            Some(idx) => idx,
            None => {
                level.push(NavNode::branch(segment, Vec::new()));
                level.len() - 1
            }
        };
        level = branch_children(level, idx);
    }
    level
}

fn append_resources(level: &mut Vec<NavNode>, resources: &ResourceVersions) {
    for (name, versions) in resources {
        let mut sorted: Vec<&VersionEntry> = versions.iter().collect();
        sort_descending(&mut sorted, |entry| entry.version.as_str());

        match sorted.as_slice() {
            [] => {}
            [only] => level.push(NavNode::leaf(name, &only.path)),
            _ => {
                let leaves: Vec<NavNode> = sorted
                    .iter()
                    .map(|entry| NavNode::leaf(version_label(name, &entry.version), &entry.path))
                    .collect();

                let existing = level.iter_mut().find_map(|node| match node {
                    NavNode::Branch { label, children } if label == name => Some(children),
                    _ => None,
                });
                match existing {
                    Some(children) => children.extend(leaves),
                    None => level.push(NavNode::branch(name, leaves)),
                }
            }
        }
    }
}

/// `"name v1.0"`, or just `"name"` for unversioned entries.
fn version_label(name: &str, version: &str) -> String {
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{name} v{version}")
    }
}

// ---------------------------------------------------------------------------
// Link rewriting
// ---------------------------------------------------------------------------

/// Point nav links at generated pages (`x.yaml` → `x.md`).
///
/// Returns the number of links rewritten.
pub fn rewrite_source_links(nodes: &mut [NavNode]) -> usize {
    let mut rewritten = 0;
    for node in nodes {
        match node {
            NavNode::Page(path) | NavNode::Leaf { path, .. } => {
                if is_source_link(path) {
                    *path = page_link_for(path);
                    rewritten += 1;
                }
            }
            NavNode::Branch { children, .. } => rewritten += rewrite_source_links(children),
        }
    }
    rewritten
}
