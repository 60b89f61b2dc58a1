//! Markdown page rendering for pipelines and tasks.
//!
//! Turns parsed [`Resource`]s into documentation pages: a heading per
//! resource, a PlantUML dependency graph for pipelines, and tables for
//! parameters, workspaces, steps and results.

mod graph;

use serde_yaml::Value;
use tracing::{debug, instrument};

use pipeviz_discovery::{
    ParamSpec, PipelineSpec, PipelineTask, ResultDecl, Step, TaskSpec, WorkspaceDecl,
};
use pipeviz_shared::{PlantUmlConfig, Resource, ResourceKind, scalar_to_string};

/// Theme value meaning "emit no `!theme` directive".
const NO_THEME: &str = "_none_";

/// Separator appended after every rendered resource.
const RESOURCE_SEPARATOR: &str = "\n---\n\n";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Rendering switches, derived from the `[plantuml]` config section.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit the task dependency graph on pipeline pages.
    pub graphs: bool,
    /// PlantUML layout directive.
    pub direction: &'static str,
    /// PlantUML theme name, or `_none_`.
    pub theme: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&PlantUmlConfig::default())
    }
}

impl From<&PlantUmlConfig> for RenderOptions {
    fn from(config: &PlantUmlConfig) -> Self {
        Self {
            graphs: config.graphs,
            direction: config.direction_directive(),
            theme: config.theme.clone(),
        }
    }
}

impl RenderOptions {
    fn theme_directive(&self) -> Option<String> {
        let theme = self.theme.trim();
        (!theme.is_empty() && theme != NO_THEME).then(|| format!("!theme {theme}"))
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Render every pipeline and task in a source file into one page.
///
/// Other kinds contribute nothing.
#[instrument(skip_all, fields(resources = resources.len()))]
pub fn render_file(resources: &[Resource], opts: &RenderOptions) -> String {
    let page: String = resources
        .iter()
        .filter_map(|resource| render_resource(resource, opts))
        .collect();

    debug!(len = page.len(), "rendered page");
    page
}

/// Render one resource, or `None` for kinds that are not documented.
pub fn render_resource(resource: &Resource, opts: &RenderOptions) -> Option<String> {
    let body = match resource.resource_kind() {
        ResourceKind::Pipeline => render_pipeline(&PipelineSpec::from_resource(resource), opts),
        ResourceKind::Task => render_task(&TaskSpec::from_resource(resource)),
        ResourceKind::Other => {
            debug!(kind = %resource.kind, name = resource.name(), "skipping undocumented kind");
            return None;
        }
    };

    Some(format!("{}{body}{RESOURCE_SEPARATOR}", heading(resource)))
}

/// `# Pipeline: name v1.0` (version omitted when unset).
fn heading(resource: &Resource) -> String {
    let version = resource.version();
    if version.is_empty() {
        format!("# {}: {}\n\n", resource.kind, resource.name())
    } else {
        format!("# {}: {} v{version}\n\n", resource.kind, resource.name())
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn render_pipeline(spec: &PipelineSpec, opts: &RenderOptions) -> String {
    let mut out = String::new();
    if opts.graphs {
        out.push_str(&graph::render_task_graph(&spec.tasks, &spec.finally, opts));
    }
    out.push_str(&render_params(&spec.params));
    out.push_str(&render_workspaces(&spec.workspaces));
    out.push_str("## Tasks\n\n");
    out.push_str(&render_pipeline_tasks(&spec.tasks));
    if !spec.finally.is_empty() {
        out.push_str("## Finally\n\n");
        out.push_str(&render_pipeline_tasks(&spec.finally));
    }
    out
}

fn render_pipeline_tasks(tasks: &[PipelineTask]) -> String {
    let mut out = String::new();

    for task in tasks {
        let name = task.name.as_deref().unwrap_or("Unnamed Task");
        out.push_str(&format!("### {name}\n\n"));

        let reference = task
            .task_ref
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .unwrap_or("Not specified");
        out.push_str(&format!("**Task Reference:** `{reference}`\n\n"));

        if !task.run_after.is_empty() {
            out.push_str("**Runs After:**\n\n");
            for dep in &task.run_after {
                out.push_str(&format!("- `{dep}`\n"));
            }
            out.push('\n');
        }

        if !task.params.is_empty() {
            out.push_str("**Parameters:**\n\n| Name | Value |\n|------|-------|\n");
            for param in &task.params {
                let name = param.name.as_deref().unwrap_or("Unnamed Parameter");
                out.push_str(&format!("| `{name}` | {} |\n", param_value_cell(param.value.as_ref())));
            }
            out.push('\n');
        }

        if !task.workspaces.is_empty() {
            out.push_str("**Workspaces:**\n\n| Name | Workspace |\n|------|-----------|\n");
            for ws in &task.workspaces {
                out.push_str(&format!(
                    "| `{}` | `{}` |\n",
                    ws.name.as_deref().unwrap_or("Unnamed Workspace"),
                    ws.workspace.as_deref().unwrap_or("Not specified"),
                ));
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
    }

    out
}

/// Lists become HTML bullet lists and multi-line strings keep their breaks;
/// everything else is shown as inline code.
fn param_value_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "`Not specified`".to_string(),
        Some(Value::Sequence(items)) => {
            let items: String = items
                .iter()
                .map(|v| format!("<li>{}</li>", scalar_to_string(v)))
                .collect();
            format!("<ul>{items}</ul>")
        }
        Some(Value::String(s)) if s.contains('\n') => s.trim_end().replace('\n', "<br>"),
        Some(other) => format!("`{}`", inline_value(other)),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn render_task(spec: &TaskSpec) -> String {
    let mut out = format!(
        "## Description\n{}\n\n",
        spec.description.as_deref().unwrap_or("No description").trim_end()
    );
    out.push_str(&render_params(&spec.params));
    out.push_str(&render_workspaces(&spec.workspaces));
    out.push_str(&render_steps(&spec.steps));
    out.push_str(&render_results(&spec.results));
    out
}

fn render_steps(steps: &[Step]) -> String {
    let mut out = String::from("## Steps\n\n");

    for (i, step) in steps.iter().enumerate() {
        match step.name.as_deref() {
            Some(name) => out.push_str(&format!("### {name}\n\n")),
            None => out.push_str(&format!("### Step {}\n\n", i + 1)),
        }
        out.push_str(&format!(
            "**Image:** `{}`\n\n",
            step.image.as_deref().unwrap_or("Not specified")
        ));

        if !step.command.is_empty() {
            out.push_str(&format!("**Command:**\n\n```\n{}\n```\n\n", join_words(&step.command)));
        }
        if !step.args.is_empty() {
            out.push_str(&format!("**Arguments:**\n\n```\n{}\n```\n\n", join_words(&step.args)));
        }
        if let Some(script) = step.script.as_deref() {
            out.push_str(&format!("**Script:**\n\n```\n{}\n```\n\n", script.trim_end()));
        }

        if !step.env.is_empty() {
            out.push_str("**Environment Variables:**\n\n| Name | Value |\n|------|-------|\n");
            for var in &step.env {
                let value = var
                    .value
                    .as_ref()
                    .map(inline_value)
                    .unwrap_or_else(|| "Not specified".to_string());
                out.push_str(&format!(
                    "| `{}` | `{value}` |\n",
                    var.name.as_deref().unwrap_or("Unnamed Variable")
                ));
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
    }

    out
}

fn render_results(results: &[ResultDecl]) -> String {
    let mut out = String::from("## Results\n\n| Name | Description |\n|------|-------------|\n");
    for result in results {
        out.push_str(&format!(
            "| `{}` | {} |\n",
            result.name.as_deref().unwrap_or("Unnamed Result"),
            table_cell(result.description.as_deref().unwrap_or("No description provided.")),
        ));
    }
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Shared sections
// ---------------------------------------------------------------------------

fn render_params(params: &[ParamSpec]) -> String {
    let mut out = String::from(
        "## Parameters\n\n| Name | Type | Description | Default |\n|------|------|-------------|---------|\n",
    );
    for param in params {
        let default = param
            .default
            .as_ref()
            .map(inline_value)
            .unwrap_or_else(|| "Not specified".to_string());
        out.push_str(&format!(
            "| `{}` | `{}` | {} | `{default}` |\n",
            param.name.as_deref().unwrap_or("Unnamed Parameter"),
            param.param_type.as_deref().unwrap_or("Not specified"),
            table_cell(param.description.as_deref().unwrap_or("No description provided.")),
        ));
    }
    out.push('\n');
    out
}

fn render_workspaces(workspaces: &[WorkspaceDecl]) -> String {
    let mut out =
        String::from("## Workspaces\n\n| Name | Description | Optional |\n|------|-------------|----------|\n");
    for ws in workspaces {
        out.push_str(&format!(
            "| `{}` | {} | {} |\n",
            ws.name.as_deref().unwrap_or("Unnamed Workspace"),
            table_cell(ws.description.as_deref().unwrap_or(" ")),
            ws.optional,
        ));
    }
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Make free text safe inside a table row.
fn table_cell(text: &str) -> String {
    text.trim_end().replace('|', "\\|").replace('\n', "<br>")
}

/// One-line rendering of any YAML value.
fn inline_value(value: &Value) -> String {
    match value {
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(inline_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::String(s) => s.replace('\n', " "),
        other => scalar_to_string(other).replace('\n', " "),
    }
}

fn join_words(words: &[Value]) -> String {
    words
        .iter()
        .map(scalar_to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
