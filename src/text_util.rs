use std::collections::HashSet;

/// Replace line breaks with single spaces so a document fits on one line.
///
/// `\r\n` counts as one break.
pub fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Remove repeated documents, keeping the first occurrence of each and the
/// original order.
pub fn dedup_preserving_order(docs: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(docs.len());
    docs.into_iter()
        .filter(|doc| seen.insert(doc.clone()))
        .collect()
}

/// Render strings as a bracketed list of quoted items: `["a", "b"]`.
pub fn format_string_list<S: AsRef<str>>(items: &[S]) -> String {
    let inner = items
        .iter()
        .map(|s| format!("{:?}", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

/// Render distances as a bracketed list with fixed precision.
pub fn format_distances(distances: &[f32]) -> String {
    let inner = distances
        .iter()
        .map(|d| format!("{d:.6}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}
