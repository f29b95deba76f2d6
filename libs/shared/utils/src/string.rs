use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

const MAX_SLUG_LEN: usize = 50;

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"))
}

/// Lowercase, runs of anything but `[a-z0-9]` collapsed to `-`, trimmed,
/// capped at 50 characters.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let dashed = non_alphanumeric().replace_all(&lowered, "-");
    dashed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect()
}

/// `base`, or `base-1`, `base-2`, ... until `is_taken` says no. An empty base
/// falls back to `<fallback_prefix>-<uuid>`.
pub fn unique_id<F>(base: &str, fallback_prefix: &str, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if base.is_empty() {
        return format!("{}-{}", fallback_prefix, Uuid::new_v4().simple());
    }

    let mut candidate = base.to_string();
    let mut suffix = 1;
    while is_taken(&candidate) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    candidate
}
