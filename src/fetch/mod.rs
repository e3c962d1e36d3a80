// src/fetch/mod.rs
pub mod gnews;
pub mod types;

pub use gnews::GNewsProvider;
pub use types::NewsProvider;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Normalize fetched text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(&decoded, "");

    // &nbsp; decodes to U+00A0, which split_whitespace also treats as a separator
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
