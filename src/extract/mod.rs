//! Line scanners that pull directories and code blocks out of free-form
//! markdown responses.

mod code_blocks;
mod structure;

pub use code_blocks::{CodeBlockExtractor, extract_code_blocks};
pub use structure::{StructureExtractor, extract_directories};

use regex::Regex;
use std::sync::OnceLock;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:`{3,}|~{3,})\s*([^\s`~]*)").expect("valid regex"))
}

/// Returns the language tag (possibly empty) when `line` is a fence marker.
fn fence_tag(line: &str) -> Option<&str> {
    fence_re()
        .captures(line)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
}
