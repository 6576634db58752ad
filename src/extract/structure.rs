use regex::Regex;
use std::str::Lines;
use std::sync::OnceLock;

use super::fence_tag;

/// Lowercased phrases that open a structure listing
const SECTION_MARKERS: &[&str] = &["directory structure", "file structure", "project structure"];

const ASCII_CONNECTORS: &[&str] = &["|--", "`--", "+--", "|"];
const BULLETS: [char; 3] = ['-', '*', '+'];

/// Scans a response for "project structure" sections and yields the lines
/// that look like directories.
///
/// Single pass over the borrowed text. Candidates with a separator are
/// yielded even when they name a file; the materializer filters those.
pub struct StructureExtractor<'a> {
    lines: Lines<'a>,
    in_section: bool,
}

impl<'a> StructureExtractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            in_section: false,
        }
    }
}

impl Iterator for StructureExtractor<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for line in self.lines.by_ref() {
            let lower = line.to_lowercase();
            if SECTION_MARKERS.iter().any(|marker| lower.contains(marker)) {
                self.in_section = true;
                continue;
            }

            if !self.in_section {
                continue;
            }

            if line.trim().is_empty() || is_heading(line) {
                self.in_section = false;
                continue;
            }

            // A bare fence wraps the listing; a tagged one starts code.
            match fence_tag(line) {
                Some("") => continue,
                Some(_) => {
                    self.in_section = false;
                    continue;
                }
                None => {}
            }

            let cleaned = strip_tree_glyphs(line);
            if is_directory_candidate(&cleaned) {
                return Some(strip_bullet(&cleaned).to_string());
            }
            tracing::trace!("structure line ignored: {}", line);
        }
        None
    }
}

/// Collects every directory candidate in `text`.
pub fn extract_directories(text: &str) -> Vec<String> {
    StructureExtractor::new(text).collect()
}

fn is_heading(line: &str) -> bool {
    line.contains("##") || line.trim_start().starts_with('#')
}

fn trailing_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+#.*$").expect("valid regex"))
}

fn is_box_drawing(c: char) -> bool {
    ('\u{2500}'..='\u{257F}').contains(&c)
}

fn strip_tree_glyphs(line: &str) -> String {
    let mut rest = line.trim();
    loop {
        let stripped = rest.trim_start_matches(|c: char| c.is_whitespace() || is_box_drawing(c));
        let stripped = ASCII_CONNECTORS
            .iter()
            .find_map(|connector| stripped.strip_prefix(connector))
            .unwrap_or(stripped);
        if stripped.len() == rest.len() {
            break;
        }
        rest = stripped;
    }

    trailing_comment_re().replace(rest, "").trim().to_string()
}

/// `- src/` names `src/`. Only reached for entries with a separator.
fn strip_bullet(candidate: &str) -> &str {
    match candidate.strip_prefix(BULLETS) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => candidate,
    }
}

fn is_directory_candidate(cleaned: &str) -> bool {
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.contains(['/', '\\']) {
        return true;
    }
    !cleaned.contains('.') && !cleaned.starts_with(BULLETS)
}
