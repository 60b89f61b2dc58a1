//! Orderable version keys for resource labels.

use std::cmp::Ordering;

use semver::Version;
use tracing::trace;

/// Sort key for a resource's version label.
///
/// Ordered by semver precedence. Labels that do not parse (including the
/// empty label) get the lowest key, equal to `0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey(Version);

impl VersionKey {
    /// The key given to empty and unparseable labels.
    pub fn lowest() -> Self {
        Self(Version::new(0, 0, 0))
    }

    /// Parse a free-form version label. Never fails.
    ///
    /// Accepts a leading `v` and pads `2` / `2.1` to `2.0.0` / `2.1.0` before
    /// handing off to semver, so labels like `"1.0"` still order correctly.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Self::lowest();
        }

        match Version::parse(&pad_components(trimmed)) {
            Ok(version) => Self(version),
            Err(e) => {
                trace!(label = raw, error = %e, "unparseable version, using lowest key");
                Self::lowest()
            }
        }
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

/// Pad the numeric core to three components, keeping any
/// pre-release/build suffix in place.
fn pad_components(label: &str) -> String {
    let split_at = label.find(['-', '+']).unwrap_or(label.len());
    let (core, suffix) = label.split_at(split_at);

    let parts = core.split('.').count();
    let all_numeric = !core.is_empty()
        && core
            .split('.')
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));

    match (all_numeric, parts) {
        (true, 1) => format!("{core}.0.0{suffix}"),
        (true, 2) => format!("{core}.0{suffix}"),
        _ => label.to_string(),
    }
}

/// Stable sort of `items` by descending version key.
///
/// Items with equal keys (including all unparseable labels) keep their
/// relative order.
pub fn sort_descending<T>(items: &mut [T], label: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| std::cmp::Reverse(VersionKey::parse(label(item))));
}

/// Compare two labels by version precedence.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a).cmp(&VersionKey::parse(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_semver() {
        assert_eq!(
            VersionKey::parse("1.2.3").as_semver(),
            &Version::new(1, 2, 3)
        );
        assert_eq!(
            VersionKey::parse("v0.9.1").as_semver(),
            &Version::new(0, 9, 1)
        );
    }

    #[test]
    fn pads_short_versions() {
        assert_eq!(VersionKey::parse("2.0").as_semver(), &Version::new(2, 0, 0));
        assert_eq!(VersionKey::parse("3").as_semver(), &Version::new(3, 0, 0));
        assert_eq!(
            VersionKey::parse("1.4-rc.1").as_semver(),
            &Version::parse("1.4.0-rc.1").unwrap()
        );
    }

    #[test]
    fn invalid_and_empty_are_lowest() {
        assert_eq!(VersionKey::parse(""), VersionKey::lowest());
        assert_eq!(VersionKey::parse("latest"), VersionKey::lowest());
        assert_eq!(VersionKey::parse("1.2.3.4"), VersionKey::lowest());
        assert_eq!(VersionKey::parse("1..2"), VersionKey::lowest());
        assert!(VersionKey::parse("0.0.1") > VersionKey::parse("garbage"));
    }

    #[test]
    fn precedence_follows_semver() {
        assert_eq!(compare_labels("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_labels("1.0.0-alpha", "1.0.0"), Ordering::Less);
        assert_eq!(compare_labels("2.0", "1.0"), Ordering::Greater);
        assert_eq!(compare_labels("nope", ""), Ordering::Equal);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut items = vec![
            ("bad-a", 0),
            ("1.0", 1),
            ("2.0", 2),
            ("bad-b", 3),
            ("1.0.0", 4),
        ];
        sort_descending(&mut items, |item| item.0);

        let order: Vec<_> = items.iter().map(|item| item.1).collect();
        assert_eq!(order, vec![2, 1, 4, 0, 3]);
    }
}
