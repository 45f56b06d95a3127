use std::collections::HashSet;
use std::hash::Hash;

/// Deduplicate while keeping first-appearance order
pub fn unique_ordered<T: Eq + Hash + Clone>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

/// Fixed-precision text for the on-screen table
pub fn format_score(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Split a comma-separated CLI list, dropping blanks
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
