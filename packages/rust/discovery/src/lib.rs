//! Source discovery and YAML front end.
//!
//! Finds pipeline/task definition files under an mkdocs `docs_dir`, parses
//! them into [`Resource`]s, and maps every source to the Markdown page that
//! will be generated for it.

mod parser;

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use pipeviz_shared::{PipevizError, Resource, Result};

pub use parser::{
    EnvVar, ParamSpec, ParamValue, PipelineSpec, PipelineTask, ResultDecl, Step, TaskRef,
    TaskSpec, WorkspaceBinding, WorkspaceDecl, parse_documents,
};

/// File extensions treated as pipeline/task sources.
const SOURCE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Extension of generated pages.
const PAGE_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Recursively collect source files under `docs_dir`.
///
/// Returned paths are relative to `docs_dir` and sorted, so repeated builds
/// process files (and therefore fill the navigation) in the same order.
#[instrument(skip_all, fields(docs_dir = %docs_dir.display()))]
pub fn discover_sources(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(docs_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(docs_dir).to_path_buf();
            PipevizError::io(path, std::io::Error::from(e))
        })?;
        if entry.file_type().is_dir() || !is_source_file(entry.path()) {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(docs_dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        debug!(path = %rel.display(), "found source");
        sources.push(rel);
    }

    info!(count = sources.len(), "discovered pipeline sources");
    Ok(sources)
}

/// Whether `path` looks like a pipeline/task definition.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Read and parse one source file.
///
/// Content that is not UTF-8 is a parse error, like malformed YAML.
pub fn load_resources(path: &Path) -> Result<Vec<Resource>> {
    let bytes = std::fs::read(path).map_err(|e| PipevizError::io(path, e))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| PipevizError::parse(format!("{}: not valid UTF-8: {e}", path.display())))?;
    parse_documents(&content).map_err(|e| match e {
        PipevizError::Parse { message } => {
            PipevizError::parse(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// The generated page path for a source, normalized with `/` separators.
///
/// `pipelines/build.yaml` → `pipelines/build.md`.
pub fn output_path_for(source: &Path) -> String {
    normalize_path(&source.with_extension(PAGE_EXTENSION).to_string_lossy())
}

/// Whether a nav link points at a source file rather than a page.
pub fn is_source_link(link: &str) -> bool {
    SOURCE_EXTENSIONS
        .iter()
        .any(|ext| link.strip_suffix(ext).is_some_and(|s| s.ends_with('.')))
}

/// Rewrite a source link (`x.yaml`) to its page link (`x.md`).
pub fn page_link_for(link: &str) -> String {
    match link.rsplit_once('.') {
        Some((stem, ext)) if SOURCE_EXTENSIONS.contains(&ext) => format!("{stem}.{PAGE_EXTENSION}"),
        _ => link.to_string(),
    }
}

/// Normalize a relative path into platform-neutral form.
///
/// Both `/` and `\` separate segments; `.` and empty segments are dropped
/// and `..` pops the previous segment. The result is joined with `/` and is
/// empty for the root.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(seg) => {
                if let Some(seg) = seg.to_str() {
                    segments.push(seg);
                }
            }
            Component::ParentDir => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pipeviz-discovery-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn discover_finds_yaml_recursively_and_sorted() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("pipelines/nested")).unwrap();
        std::fs::write(tmp.join("pipelines/b.yaml"), "kind: Pipeline\n").unwrap();
        std::fs::write(tmp.join("pipelines/nested/a.yml"), "kind: Task\n").unwrap();
        std::fs::write(tmp.join("index.md"), "# Home\n").unwrap();

        let sources = discover_sources(&tmp).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("pipelines/b.yaml"),
                PathBuf::from("pipelines/nested/a.yml"),
            ]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn discover_missing_dir_is_io_error() {
        let err = discover_sources(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, PipevizError::Io { .. }));
    }

    #[test]
    fn load_resources_reports_file_on_parse_error() {
        let tmp = temp_dir();
        let path = tmp.join("broken.yaml");
        std::fs::write(&path, "kind: [\n").unwrap();

        let err = load_resources(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_resources_non_utf8_is_parse_error() {
        let tmp = temp_dir();
        let path = tmp.join("latin1.yaml");
        std::fs::write(&path, b"kind: Task\nmetadata:\n  name: \xff\xfe\n").unwrap();

        let err = load_resources(&path).unwrap_err();
        assert!(matches!(err, PipevizError::Parse { .. }));
        assert!(err.to_string().contains("latin1.yaml"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn output_path_rewrites_extension() {
        assert_eq!(
            output_path_for(Path::new("pipelines/build.yaml")),
            "pipelines/build.md"
        );
        assert_eq!(output_path_for(Path::new("./tasks/clone.yml")), "tasks/clone.md");
    }

    #[test]
    fn source_links() {
        assert!(is_source_link("pipelines/build.yaml"));
        assert!(is_source_link("tasks/x.yml"));
        assert!(!is_source_link("index.md"));
        assert!(!is_source_link("notyaml"));
        assert_eq!(page_link_for("pipelines/build.yaml"), "pipelines/build.md");
        assert_eq!(page_link_for("index.md"), "index.md");
    }

    #[test]
    fn normalize_path_forms() {
        assert_eq!(normalize_path("group1/group2"), "group1/group2");
        assert_eq!(normalize_path("group1\\group2\\"), "group1/group2");
        assert_eq!(normalize_path("./a//b/./c"), "a/b/c");
        assert_eq!(normalize_path("a/b/../c"), "a/c");
        assert_eq!(normalize_path("../a"), "../a");
        assert_eq!(normalize_path(""), "");
    }
}
