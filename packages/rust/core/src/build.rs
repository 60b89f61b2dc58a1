//! End-to-end `build`: docs dir → parse → render pages → registries → nav.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use pipeviz_discovery::{discover_sources, load_resources, output_path_for};
use pipeviz_markdown::{RenderOptions, render_file};
use pipeviz_shared::{AppConfig, NavNode, PipevizError, ResourceKind, Result};

use crate::grouping::GroupingOffset;
use crate::nav::{SectionLabels, rewrite_source_links, update_navigation};
use crate::registry::{GroupingOffsets, Registries};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration, resolved once from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    pub render: RenderOptions,
    /// When off, pages are still rendered but nothing is recorded or added
    /// to the navigation.
    pub nav_generation: bool,
    pub sections: SectionLabels,
    pub offsets: GroupingOffsets,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for VisualizerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            render: RenderOptions::from(&config.plantuml),
            nav_generation: config.nav.generation,
            sections: SectionLabels::from(&config.nav),
            offsets: GroupingOffsets {
                pipelines: GroupingOffset::parse_setting(
                    config.nav.pipeline_grouping_offset.as_deref(),
                ),
                tasks: GroupingOffset::parse_setting(config.nav.task_grouping_offset.as_deref()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Progress + results
// ---------------------------------------------------------------------------

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each source file.
    fn file_processed(&self, path: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_processed(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &BuildReport) {}
}

/// One source file turned into a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Source path relative to the docs dir.
    pub source: PathBuf,
    /// Generated page path relative to the docs dir.
    pub output_path: String,
    /// Documents found in the source.
    pub resources: usize,
}

/// Summary of a `build` run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub pages: Vec<ProcessedFile>,
    /// Sources that could not be read or parsed, or whose page path was
    /// already taken by an earlier source.
    pub skipped: Vec<PathBuf>,
    pub pipelines: usize,
    pub tasks: usize,
    pub links_rewritten: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Visualizer
// ---------------------------------------------------------------------------

/// Renders pipeline/task sources and assembles their navigation.
#[derive(Debug, Clone, Default)]
pub struct Visualizer {
    config: VisualizerConfig,
}

impl Visualizer {
    pub fn new(config: VisualizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Render one source into its page and record its resources.
    ///
    /// Returns `Ok(None)` when the source cannot be read or does not parse;
    /// the file is logged and skipped. Only failing to write the page is an
    /// error.
    #[instrument(skip_all, fields(source = %source.display()))]
    pub fn process_file(
        &self,
        docs_dir: &Path,
        source: &Path,
        registries: &mut Registries,
    ) -> Result<Option<ProcessedFile>> {
        let resources = match load_resources(&docs_dir.join(source)) {
            Ok(resources) => resources,
            Err(e @ PipevizError::Parse { .. }) => {
                warn!(error = %e, "skipping unparseable source");
                return Ok(None);
            }
            Err(e @ PipevizError::Io { .. }) => {
                warn!(error = %e, "skipping unreadable source");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let output_path = output_path_for(source);
        let page = render_file(&resources, &self.config.render);
        write_page(&docs_dir.join(&output_path), &page)?;

        if self.config.nav_generation {
            for resource in &resources {
                let kind = resource.resource_kind();
                if kind == ResourceKind::Other {
                    debug!(kind = %resource.kind, "not adding to navigation");
                    continue;
                }
                registries.record_resource(
                    kind,
                    resource.name(),
                    &resource.version(),
                    &output_path,
                    &self.config.offsets,
                );
            }
        }

        Ok(Some(ProcessedFile {
            source: source.to_path_buf(),
            output_path,
            resources: resources.len(),
        }))
    }

    /// Run the full build over `docs_dir`, extending `nav` in place.
    ///
    /// 1. Discover sources
    /// 2. Render each source and record its resources
    /// 3. Build the pipelines and tasks sections
    /// 4. Point existing nav links at the generated pages
    #[instrument(skip_all, fields(docs_dir = %docs_dir.display()))]
    pub fn build(
        &self,
        docs_dir: &Path,
        nav: &mut Vec<NavNode>,
        progress: &dyn ProgressReporter,
    ) -> Result<BuildReport> {
        let start = Instant::now();
        let mut report = BuildReport::default();

        progress.phase("Discovering pipeline sources");
        let sources = discover_sources(docs_dir)?;

        progress.phase("Rendering pages");
        let mut registries = Registries::new();
        let mut claimed: HashMap<String, &Path> = HashMap::new();
        let total = sources.len();
        for (i, source) in sources.iter().enumerate() {
            // `x.yaml` and `x.yml` would both render to `x.md`; first one wins.
            let output_path = output_path_for(source);
            if let Some(first) = claimed.get(&output_path) {
                warn!(
                    source = %source.display(),
                    kept = %first.display(),
                    page = %output_path,
                    "page already generated from another source, skipping"
                );
                report.skipped.push(source.clone());
                progress.file_processed(&source.to_string_lossy(), i + 1, total);
                continue;
            }
            claimed.insert(output_path, source.as_path());

            match self.process_file(docs_dir, source, &mut registries)? {
                Some(page) => report.pages.push(page),
                None => report.skipped.push(source.clone()),
            }
            progress.file_processed(&source.to_string_lossy(), i + 1, total);
        }

        report.pipelines = registries.pipelines.len();
        report.tasks = registries.tasks.len();

        if self.config.nav_generation {
            progress.phase("Building navigation");
            update_navigation(nav, &registries, &self.config.sections);
        } else {
            debug!("navigation generation disabled");
        }

        report.links_rewritten = rewrite_source_links(nav);
        report.elapsed = start.elapsed();

        info!(
            pages = report.pages.len(),
            skipped = report.skipped.len(),
            pipelines = report.pipelines,
            tasks = report.tasks,
            elapsed = ?report.elapsed,
            "build complete"
        );
        progress.done(&report);

        Ok(report)
    }
}

fn write_page(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipevizError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| PipevizError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeviz_shared::Nav;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeviz-build-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const TEST_PIPELINE: &str = r#"
kind: Pipeline
metadata:
  name: test-pipeline
  labels:
    app.kubernetes.io/version: "0.1"
spec:
  tasks:
    - name: task1
      taskRef:
        name: task-reference
"#;

    fn versioned_task(name: &str, version: &str) -> String {
        format!(
            "kind: Task\nmetadata:\n  name: {name}\n  labels:\n    app.kubernetes.io/version: \"{version}\"\n"
        )
    }

    #[test]
    fn config_from_app_config() {
        let mut app = AppConfig::default();
        app.nav.pipeline_grouping_offset = Some("0:-1".into());
        app.nav.task_grouping_offset = Some("garbage".into());
        app.nav.section_tasks = "Steps".into();

        let config = VisualizerConfig::from(&app);
        assert_eq!(config.offsets.pipelines, Some(GroupingOffset::new(0, -1)));
        assert_eq!(config.offsets.tasks, None);
        assert_eq!(config.sections.tasks, "Steps");
        assert!(config.nav_generation);
        assert!(config.render.graphs);
    }

    #[test]
    fn end_to_end_pipeline_page_and_nav() {
        let tmp = temp_dir();
        write(&tmp, "test_pipeline.yaml", TEST_PIPELINE);

        let mut nav: Nav = Vec::new();
        let report = Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].output_path, "test_pipeline.md");

        let md = std::fs::read_to_string(tmp.join("test_pipeline.md")).unwrap();
        assert!(md.contains("# Pipeline: test-pipeline v0.1"));
        assert!(md.contains("## Tasks"));
        assert!(md.contains("### task1"));

        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].label(), Some("Pipelines"));
        assert_eq!(nav[1].label(), Some("Tasks"));
        assert_eq!(
            nav[0],
            NavNode::branch(
                "Pipelines",
                vec![NavNode::leaf("test-pipeline", "test_pipeline.md")]
            )
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn versions_across_files_merge_under_group() {
        let tmp = temp_dir();
        write(&tmp, "team/tasks/clone-1.0.yaml", &versioned_task("clone", "1.0.0"));
        write(&tmp, "team/tasks/clone-1.1.yaml", &versioned_task("clone", "1.1.0"));

        let mut app = AppConfig::default();
        app.nav.task_grouping_offset = Some("0:-1".into());
        let visualizer = Visualizer::new(VisualizerConfig::from(&app));

        let mut nav: Nav = Vec::new();
        let report = visualizer.build(&tmp, &mut nav, &SilentProgress).unwrap();
        assert_eq!(report.tasks, 2);

        assert_eq!(
            nav[1],
            NavNode::branch(
                "Tasks",
                vec![NavNode::branch(
                    "team",
                    vec![NavNode::branch(
                        "clone",
                        vec![
                            NavNode::leaf("clone v1.1.0", "team/tasks/clone-1.1.md"),
                            NavNode::leaf("clone v1.0.0", "team/tasks/clone-1.0.md"),
                        ]
                    )]
                )]
            )
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unparseable_source_is_skipped() {
        let tmp = temp_dir();
        write(&tmp, "broken.yaml", "kind: [\n");
        write(&tmp, "ok.yaml", &versioned_task("ok", "1.0"));

        let mut nav: Nav = Vec::new();
        let report = Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("broken.yaml")]);
        assert_eq!(report.pages.len(), 1);
        assert!(!tmp.join("broken.md").exists());
        assert!(tmp.join("ok.md").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn nav_generation_disabled_still_renders() {
        let tmp = temp_dir();
        write(&tmp, "p.yaml", TEST_PIPELINE);

        let mut app = AppConfig::default();
        app.nav.generation = false;
        let visualizer = Visualizer::new(VisualizerConfig::from(&app));

        let mut nav: Nav = vec![NavNode::leaf("Pipeline", "p.yaml")];
        let report = visualizer.build(&tmp, &mut nav, &SilentProgress).unwrap();

        assert!(tmp.join("p.md").exists());
        assert_eq!(report.pipelines, 0);
        assert_eq!(nav, vec![NavNode::leaf("Pipeline", "p.md")]);
        assert_eq!(report.links_rewritten, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn other_kinds_are_rendered_out_of_nav() {
        let tmp = temp_dir();
        write(
            &tmp,
            "mixed.yaml",
            "kind: ConfigMap\nmetadata:\n  name: cm\n---\nkind: Task\nmetadata:\n  name: t\n",
        );

        let mut registries = Registries::new();
        let processed = Visualizer::default()
            .process_file(&tmp, Path::new("mixed.yaml"), &mut registries)
            .unwrap()
            .expect("parsed");

        assert_eq!(processed.resources, 2);
        assert_eq!(registries.pipelines.len(), 0);
        assert_eq!(registries.tasks.get("", "t").map(<[_]>::len), Some(1));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn declared_section_stub_is_filled() {
        let tmp = temp_dir();
        write(&tmp, "pipelines/p.yaml", TEST_PIPELINE);

        let mut nav: Nav = vec![
            NavNode::leaf("Home", "index.md"),
            NavNode::branch("Reference", vec![NavNode::branch("Pipelines", vec![])]),
        ];
        Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(nav.len(), 3);
        assert_eq!(
            nav[1],
            NavNode::branch(
                "Reference",
                vec![NavNode::branch(
                    "Pipelines",
                    vec![NavNode::leaf("test-pipeline", "pipelines/p.md")]
                )]
            )
        );
        assert_eq!(nav[2], NavNode::branch("Tasks", vec![]));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn non_utf8_source_is_skipped() {
        let tmp = temp_dir();
        std::fs::write(tmp.join("a_bad.yaml"), b"kind: Task\nmetadata:\n  name: \xff\xfe\n").unwrap();
        write(&tmp, "b_ok.yaml", &versioned_task("ok", "1.0"));

        let mut nav: Nav = Vec::new();
        let report = Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("a_bad.yaml")]);
        assert!(!tmp.join("a_bad.md").exists());
        assert!(tmp.join("b_ok.md").exists());
        assert_eq!(
            nav[1],
            NavNode::branch("Tasks", vec![NavNode::leaf("ok", "b_ok.md")])
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_source_is_skipped() {
        let tmp = temp_dir();
        std::os::unix::fs::symlink(tmp.join("missing.yaml"), tmp.join("a_link.yaml")).unwrap();
        write(&tmp, "b_ok.yaml", &versioned_task("ok", "1.0"));

        let mut nav: Nav = Vec::new();
        let report = Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("a_link.yaml")]);
        assert_eq!(report.pages.len(), 1);
        assert!(tmp.join("b_ok.md").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn colliding_page_paths_keep_first_source() {
        let tmp = temp_dir();
        write(&tmp, "x.yaml", &versioned_task("first", "1.0"));
        write(&tmp, "x.yml", &versioned_task("second", "1.0"));

        let mut nav: Nav = Vec::new();
        let report = Visualizer::default()
            .build(&tmp, &mut nav, &SilentProgress)
            .unwrap();

        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.skipped, vec![PathBuf::from("x.yml")]);
        assert_eq!(report.tasks, 1);

        let md = std::fs::read_to_string(tmp.join("x.md")).unwrap();
        assert!(md.contains("first"));
        assert!(!md.contains("second"));
        assert_eq!(
            nav[1],
            NavNode::branch("Tasks", vec![NavNode::leaf("first", "x.md")])
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
