//! PlantUML task-dependency graph for pipeline pages.

use pipeviz_discovery::PipelineTask;

use crate::RenderOptions;

/// Name given to tasks without a `name`.
const UNNAMED_TASK: &str = "Unnamed Task";

/// Render the `runAfter` graph of a pipeline as a fenced PlantUML block.
///
/// Edges:
/// - `Start` to every task with no `runAfter`
/// - each dependency to the tasks that run after it
/// - every task nothing depends on to the first `finally` task
pub(crate) fn render_task_graph(
    tasks: &[PipelineTask],
    finally: &[PipelineTask],
    opts: &RenderOptions,
) -> String {
    let mut out = String::from("```plantuml\n@startuml\n");
    out.push_str(opts.direction);
    out.push('\n');
    if let Some(theme) = opts.theme_directive() {
        out.push_str(&theme);
        out.push('\n');
    }

    // dependency -> dependants, in first-seen order
    let mut dependants: Vec<(&str, Vec<&str>)> = Vec::new();

    for task in tasks {
        let name = task_name(task);
        if task.run_after.is_empty() {
            out.push_str(&format!("\"Start\" --> \"{name}\"\n"));
            continue;
        }
        for dep in &task.run_after {
            match dependants.iter_mut().find(|(d, _)| *d == dep.as_str()) {
                Some((_, list)) => list.push(name),
                None => dependants.push((dep.as_str(), vec![name])),
            }
        }
    }

    for (dep, list) in &dependants {
        for name in list {
            out.push_str(&format!("\"{dep}\" --> \"{name}\"\n"));
        }
    }

    if let Some(first_final) = finally.first() {
        let final_name = first_final.name.as_deref().unwrap_or("Finally Task");
        for task in tasks {
            let name = task_name(task);
            if !dependants.iter().any(|(d, _)| *d == name) {
                out.push_str(&format!("\"{name}\" --> \"{final_name}\"\n"));
            }
        }
    }

    out.push_str("@enduml\n```\n\n");
    out
}

fn task_name(task: &PipelineTask) -> &str {
    task.name.as_deref().unwrap_or(UNNAMED_TASK)
}
