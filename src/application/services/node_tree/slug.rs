use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// URL-safe slug for a display name. Deterministic; no uniqueness handling.
pub fn generate_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RE.replace_all(&stripped, "-");
    HYPHENS_RE.replace_all(&hyphenated, "-").into_owned()
}
