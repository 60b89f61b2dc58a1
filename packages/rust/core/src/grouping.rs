//! Grouping paths: which navigation group a generated page is filed under.
//!
//! A [`GroupingOffset`] selects a slice of the page's directory segments,
//! with Python-style negative indices. `docs/group1/group2/pipelines/x.md`
//! with `0:-1` is filed under `group1/group2` (relative to `docs/`).

use std::str::FromStr;

use tracing::{debug, warn};

use pipeviz_discovery::normalize_path;
use pipeviz_shared::PipevizError;

/// A `start:end` slice over a page's directory segments.
///
/// `end == 0` means "through the last segment", not "up to index 0".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOffset {
    pub start: i64,
    pub end: i64,
}

impl GroupingOffset {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Parse an optional config setting.
    ///
    /// A malformed setting is logged and treated as absent, which files
    /// every page at the root of its section.
    pub fn parse_setting(setting: Option<&str>) -> Option<Self> {
        let raw = setting?;
        match raw.parse() {
            Ok(offset) => Some(offset),
            Err(e) => {
                warn!(setting = raw, error = %e, "invalid grouping offset, using root grouping");
                None
            }
        }
    }

    /// Resolve the slice against `len` segments as `(start, end)` indices.
    fn bounds(&self, len: usize) -> (usize, usize) {
        let start = clamp_index(self.start, len);
        let end = if self.end == 0 {
            len
        } else {
            clamp_index(self.end, len)
        };
        (start, end)
    }
}

impl FromStr for GroupingOffset {
    type Err = PipevizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| PipevizError::config(format!("grouping offset '{s}' is not start:end")))?;

        let parse = |part: &str| {
            part.trim().parse::<i64>().map_err(|e| {
                PipevizError::config(format!("grouping offset '{s}': '{part}' {e}"))
            })
        };

        Ok(Self::new(parse(start)?, parse(end)?))
    }
}

impl std::fmt::Display for GroupingOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Python slice index semantics: negatives count from the end, and
/// everything is clamped to `0..=len`.
fn clamp_index(index: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { index.saturating_add(len_i) } else { index };
    usize::try_from(resolved.clamp(0, len_i)).unwrap_or(len)
}

/// Compute the group path for a page at `output_path`.
///
/// Returns `""` (the section root) when no offset is configured or the
/// slice selects nothing. The result is normalized with `/` separators.
pub fn group_path(output_path: &str, offset: Option<GroupingOffset>) -> String {
    let Some(offset) = offset else {
        return String::new();
    };

    let normalized = normalize_path(output_path);
    let dir = normalized.rsplit_once('/').map_or("", |(dir, _file)| dir);
    let segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();

    let (start, end) = offset.bounds(segments.len());
    if start >= end {
        debug!(path = output_path, %offset, "grouping offset selects nothing, using root");
        return String::new();
    }

    normalize_path(&segments[start..end].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPED: &str = "group1/group2/pipelines/grouped-pipeline.md";

    #[test]
    fn no_offset_is_root() {
        assert_eq!(group_path(GROUPED, None), "");
    }

    #[test]
    fn negative_end_drops_trailing_segments() {
        assert_eq!(
            group_path(GROUPED, Some(GroupingOffset::new(0, -1))),
            "group1/group2"
        );
    }

    #[test]
    fn zero_end_slices_to_the_end() {
        assert_eq!(
            group_path(GROUPED, Some(GroupingOffset::new(0, 0))),
            "group1/group2/pipelines"
        );
        assert_eq!(
            group_path(GROUPED, Some(GroupingOffset::new(1, 0))),
            "group2/pipelines"
        );
        assert_eq!(
            group_path(GROUPED, Some(GroupingOffset::new(-1, 0))),
            "pipelines"
        );
    }

    #[test]
    fn positive_range() {
        assert_eq!(group_path(GROUPED, Some(GroupingOffset::new(1, 2))), "group2");
    }

    #[test]
    fn invalid_range_falls_back_to_root() {
        assert_eq!(group_path(GROUPED, Some(GroupingOffset::new(-1, 1))), "");
        assert_eq!(group_path(GROUPED, Some(GroupingOffset::new(2, 1))), "");
        assert_eq!(group_path(GROUPED, Some(GroupingOffset::new(10, 0))), "");
        assert_eq!(group_path(GROUPED, Some(GroupingOffset::new(0, -10))), "");
    }

    #[test]
    fn page_at_root_has_no_segments() {
        assert_eq!(group_path("pipeline.md", Some(GroupingOffset::new(0, 0))), "");
    }

    #[test]
    fn windows_separators_are_normalized() {
        assert_eq!(
            group_path(
                "group1\\group2\\pipelines\\x.md",
                Some(GroupingOffset::new(0, -1))
            ),
            "group1/group2"
        );
    }

    #[test]
    fn grouping_is_pure() {
        let offset = Some(GroupingOffset::new(0, -1));
        assert_eq!(group_path(GROUPED, offset), group_path(GROUPED, offset));
    }

    #[test]
    fn parse_offset_settings() {
        assert_eq!("0:-1".parse::<GroupingOffset>().unwrap(), GroupingOffset::new(0, -1));
        assert_eq!(" 1 : -2 ".parse::<GroupingOffset>().unwrap(), GroupingOffset::new(1, -2));
        assert!("1".parse::<GroupingOffset>().is_err());
        assert!("a:b".parse::<GroupingOffset>().is_err());
        assert!("1:2:3".parse::<GroupingOffset>().is_err());

        assert_eq!(GroupingOffset::parse_setting(None), None);
        assert_eq!(GroupingOffset::parse_setting(Some("bogus")), None);
        assert_eq!(
            GroupingOffset::parse_setting(Some("0:-1")),
            Some(GroupingOffset::new(0, -1))
        );
        assert_eq!(GroupingOffset::new(1, -2).to_string(), "1:-2");
    }
}
