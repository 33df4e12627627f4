//! Decides which enumerated files still need importing.

use crate::canonical::{canonicalize, DedupKey};
use crate::ledger::Ledger;
use crate::source::SourceItem;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Outcome of resolving one source tree against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<I> {
    /// Keys accepted this run; merge into the ledger once copied
    pub imported: BTreeSet<DedupKey>,
    /// Raw relative paths already present in the ledger
    pub skipped: BTreeSet<String>,
    /// Items to copy, keyed by their raw relative path
    pub copy_plan: BTreeMap<String, I>,
}

impl<I> Resolution<I> {
    pub fn is_empty(&self) -> bool {
        self.copy_plan.is_empty()
    }
}

/// Partition `entries` into files to import and files already imported.
///
/// Entries are visited in key order, so when two raw paths canonicalize
/// to the same key the first one wins and the rest are skipped. The
/// ledger itself is left untouched.
pub fn resolve<I: SourceItem>(
    source_root: &str,
    entries: BTreeMap<String, I>,
    ledger: &Ledger,
) -> Result<Resolution<I>> {
    let mut resolution = Resolution {
        imported: BTreeSet::new(),
        skipped: BTreeSet::new(),
        copy_plan: BTreeMap::new(),
    };

    for item in entries.into_values() {
        let relative = relative_path(&item.absolute_path(), source_root)?;
        let key = canonicalize(&relative);

        if ledger.contains(&key) || resolution.imported.contains(&key) {
            debug!("Already imported: {}", relative);
            resolution.skipped.insert(relative);
        } else {
            debug!("To import: {}", relative);
            resolution.imported.insert(key);
            resolution.copy_plan.insert(relative, item);
        }
    }

    Ok(resolution)
}

/// Strip `root` and one leading separator from `absolute`.
pub fn relative_path(absolute: &str, root: &str) -> Result<String> {
    let rest = absolute
        .strip_prefix(root)
        .ok_or_else(|| Error::PathAssumption {
            path: absolute.to_string(),
            expected_prefix: root.to_string(),
        })?;
    let rest = rest
        .strip_prefix('\\')
        .or_else(|| rest.strip_prefix('/'))
        .unwrap_or(rest);
    Ok(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FakeItem(PathBuf);

    impl SourceItem for FakeItem {
        fn absolute_path(&self) -> String {
            self.0.to_string_lossy().into_owned()
        }

        fn modified(&self) -> Option<DateTime<Local>> {
            None
        }

        fn local_path(&self) -> &Path {
            &self.0
        }
    }

    const ROOT: &str = "E:\\DCIM";

    fn entries(relative: &[&str]) -> BTreeMap<String, FakeItem> {
        relative
            .iter()
            .map(|r| {
                let absolute = format!("{}\\{}", ROOT, r);
                (absolute.clone(), FakeItem(PathBuf::from(absolute)))
            })
            .collect()
    }

    fn ledger_of(paths: &[&str]) -> Ledger {
        paths.iter().map(|p| canonicalize(p)).collect()
    }

    fn strings(set: &BTreeSet<DedupKey>) -> Vec<&str> {
        set.iter().map(|k| k.as_str()).collect()
    }

    #[test]
    fn test_relative_path_strips_root_and_separator() {
        assert_eq!(relative_path("E:\\DCIM\\a\\b.jpg", "E:\\DCIM").unwrap(), "a\\b.jpg");
        assert_eq!(relative_path("/mnt/card/a/b.jpg", "/mnt/card").unwrap(), "a/b.jpg");
        assert_eq!(relative_path("/mnt/card/a/b.jpg", "/mnt/card/").unwrap(), "a/b.jpg");
        // only one separator is removed
        assert_eq!(relative_path("/mnt/card//b.jpg", "/mnt/card").unwrap(), "/b.jpg");
    }

    #[test]
    fn test_relative_path_outside_root() {
        let err = relative_path("F:\\Other\\b.jpg", "E:\\DCIM").unwrap_err();
        assert!(matches!(err, Error::PathAssumption { .. }));
    }

    #[test]
    fn test_resolve_fails_on_foreign_entry() {
        let mut input = entries(&["202301\\IMG_1.JPG"]);
        input.insert(
            "F:\\elsewhere.jpg".to_string(),
            FakeItem(PathBuf::from("F:\\elsewhere.jpg")),
        );

        let result = resolve(ROOT, input, &Ledger::new());
        assert!(matches!(result, Err(Error::PathAssumption { .. })));
    }

    #[test]
    fn test_split_folder_scenario() {
        let root = "/media/card";
        let input: BTreeMap<_, _> = ["202301/IMG_1.JPG", "202301_a/IMG_2.JPG"]
            .iter()
            .map(|r| {
                let absolute = format!("{}/{}", root, r);
                (absolute.clone(), FakeItem(PathBuf::from(absolute)))
            })
            .collect();
        let ledger = ledger_of(&["202301/IMG_1.JPG"]);

        let resolution = resolve(root, input, &ledger).unwrap();

        assert_eq!(strings(&resolution.imported), vec!["202301__/IMG_2.JPG"]);
        assert_eq!(
            resolution.copy_plan.keys().collect::<Vec<_>>(),
            vec!["202301_a/IMG_2.JPG"]
        );
        assert_eq!(
            resolution.skipped.iter().collect::<Vec<_>>(),
            vec!["202301/IMG_1.JPG"]
        );
    }

    #[test]
    fn test_ledger_entry_matches_any_split_sibling() {
        let ledger = ledger_of(&["202301_a\\IMG_1.JPG"]);
        let resolution = resolve(ROOT, entries(&["202301_b\\IMG_1.JPG"]), &ledger).unwrap();

        assert!(resolution.is_empty());
        assert_eq!(
            resolution.skipped.iter().collect::<Vec<_>>(),
            vec!["202301_b\\IMG_1.JPG"]
        );
    }

    #[test]
    fn test_duplicates_within_one_run_first_wins() {
        let resolution = resolve(
            ROOT,
            entries(&["202301_b\\IMG_1.JPG", "202301_a\\IMG_1.JPG"]),
            &Ledger::new(),
        )
        .unwrap();

        assert_eq!(strings(&resolution.imported), vec!["202301__\\IMG_1.JPG"]);
        assert_eq!(
            resolution.copy_plan.keys().collect::<Vec<_>>(),
            vec!["202301_a\\IMG_1.JPG"]
        );
        assert_eq!(
            resolution.skipped.iter().collect::<Vec<_>>(),
            vec!["202301_b\\IMG_1.JPG"]
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let names = ["202302\\c.jpg", "202301_a\\b.jpg", "202301\\a.jpg", "202301_b\\b.jpg"];
        let ledger = ledger_of(&["202301\\a.jpg"]);

        let first = resolve(ROOT, entries(&names), &ledger).unwrap();
        let second = resolve(ROOT, entries(&names), &ledger).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_rerun_with_merged_ledger_is_empty() {
        let names = ["202301\\a.jpg", "202301_a\\b.jpg", "202302\\c.mp4"];
        let mut ledger = Ledger::new();

        let first = resolve(ROOT, entries(&names), &ledger).unwrap();
        assert_eq!(first.copy_plan.len(), 3);
        ledger.extend(first.imported);

        let second = resolve(ROOT, entries(&names), &ledger).unwrap();
        assert!(second.is_empty());
        assert!(second.imported.is_empty());
        assert_eq!(second.skipped.len(), 3);
    }

    #[test]
    fn test_no_entry_both_imported_and_skipped() {
        let names = ["a_b\\1.jpg", "a_c\\1.jpg", "a\\1.jpg", "b\\2.jpg", "b_z\\2.jpg"];
        let ledger = ledger_of(&["b\\2.jpg"]);

        let resolution = resolve(ROOT, entries(&names), &ledger).unwrap();

        for planned in resolution.copy_plan.keys() {
            assert!(!resolution.skipped.contains(planned));
        }
        assert_eq!(
            resolution.copy_plan.len() + resolution.skipped.len(),
            names.len()
        );
        assert_eq!(resolution.imported.len(), resolution.copy_plan.len());
    }

    #[test]
    fn test_ledger_not_mutated() {
        let ledger = ledger_of(&["x\\1.jpg"]);
        let before = ledger.clone();

        resolve(ROOT, entries(&["y\\2.jpg"]), &ledger).unwrap();

        assert_eq!(ledger, before);
    }
}
