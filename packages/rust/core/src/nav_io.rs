//! Reading and writing navigation trees as YAML.
//!
//! Input may be a bare nav list or a full `mkdocs.yml`, in which case its
//! `nav` key is used.

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use pipeviz_shared::{Nav, PipevizError, Result};

/// Load a navigation tree from `path`.
///
/// An mkdocs config without a `nav` key yields an empty tree.
pub fn load_nav(path: &Path) -> Result<Nav> {
    let content = std::fs::read_to_string(path).map_err(|e| PipevizError::io(path, e))?;
    parse_nav(&content)
        .map_err(|e| PipevizError::validation(format!("{}: {e}", path.display())))
}

/// Parse a nav list or an mkdocs config document.
pub fn parse_nav(content: &str) -> Result<Nav> {
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| PipevizError::parse(e.to_string()))?;

    let nav_value = match value {
        Value::Null => return Ok(Nav::new()),
        Value::Sequence(_) => value,
        Value::Mapping(mut map) => match map.remove("nav") {
            Some(nav) => nav,
            None => {
                debug!("config has no nav key, starting from an empty nav");
                return Ok(Nav::new());
            }
        },
        _ => {
            return Err(PipevizError::validation(
                "expected a nav list or a mapping with a `nav` key",
            ));
        }
    };

    serde_yaml::from_value(nav_value).map_err(|e| PipevizError::validation(e.to_string()))
}

/// Serialize a navigation tree to mkdocs YAML.
pub fn nav_to_yaml(nav: &Nav) -> Result<String> {
    serde_yaml::to_string(nav).map_err(|e| PipevizError::validation(e.to_string()))
}

/// Write a navigation tree to `path` as YAML.
pub fn save_nav(path: &Path, nav: &Nav) -> Result<()> {
    let yaml = nav_to_yaml(nav)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipevizError::io(parent, e))?;
    }
    std::fs::write(path, yaml).map_err(|e| PipevizError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeviz_shared::NavNode;

    #[test]
    fn parse_bare_list() {
        let nav = parse_nav("- index.md\n- Pipelines: []\n").unwrap();
        assert_eq!(
            nav,
            vec![
                NavNode::Page("index.md".into()),
                NavNode::branch("Pipelines", vec![]),
            ]
        );
    }

    #[test]
    fn parse_mkdocs_config() {
        let yaml = r#"
site_name: CI docs
plugins:
  - search
nav:
  - Home: index.md
  - Tasks: []
"#;
        let nav = parse_nav(yaml).unwrap();
        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0], NavNode::leaf("Home", "index.md"));
    }

    #[test]
    fn mkdocs_config_without_nav_is_empty() {
        assert!(parse_nav("site_name: x\n").unwrap().is_empty());
        assert!(parse_nav("").unwrap().is_empty());
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            parse_nav("42\n"),
            Err(PipevizError::Validation { .. })
        ));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("pipeviz-nav-io-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nav.yml");
        let nav = vec![NavNode::branch(
            "Pipelines",
            vec![NavNode::branch(
                "p",
                vec![
                    NavNode::leaf("p v2.0", "p2.md"),
                    NavNode::leaf("p v1.0", "p1.md"),
                ],
            )],
        )];

        save_nav(&path, &nav).unwrap();
        assert_eq!(load_nav(&path).unwrap(), nav);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
