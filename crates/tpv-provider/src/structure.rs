//! Small conversion helpers shared by resources.

use std::collections::BTreeSet;

/// Strip leading and trailing slashes from an inventory path.
pub fn normalize_folder_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

pub fn folder_path_is_empty(path: &str) -> bool {
    normalize_folder_path(path).is_empty()
}

/// Entries only in `new` and entries only in `old`, each sorted.
pub fn diff_string_sets(old: &[String], new: &[String]) -> (Vec<String>, Vec<String>) {
    let old: BTreeSet<&String> = old.iter().collect();
    let new: BTreeSet<&String> = new.iter().collect();
    let added = new.difference(&old).map(|s| s.to_string()).collect();
    let removed = old.difference(&new).map(|s| s.to_string()).collect();
    (added, removed)
}
