//! File-key normalization.
//!
//! Pooled handles are grouped by database file identity. Paths naming the
//! same file must map to the same key before they reach the coordinator,
//! which treats keys as opaque strings.

/// Normalize a data source into a pool file key.
///
/// Comparison is case-insensitive and separator-insensitive, so
/// `C:\Data\App.db` and `c:/data/app.db` pool together. The `:memory:`
/// pseudo-path is preserved as its own key.
///
/// # Example
///
/// ```rust
/// use sqlite_client::normalize_key;
///
/// assert_eq!(normalize_key("C:\\Data\\App.db"), "c:/data/app.db");
/// assert_eq!(normalize_key(":memory:"), ":memory:");
/// ```
#[must_use]
pub fn normalize_key(data_source: &str) -> String {
    let trimmed = data_source.trim();
    if trimmed.eq_ignore_ascii_case(":memory:") {
        return ":memory:".to_string();
    }
    trimmed.replace('\\', "/").to_lowercase()
}
