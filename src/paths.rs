//! Path normalization for file names lifted out of model responses.
//!
//! Everything returned here is meant to be joined onto an output root, so
//! absolute paths are collapsed to their basename and parent-directory
//! segments are dropped.

const QUOTE_CHARS: [char; 3] = ['"', '\'', '`'];

/// File names that carry no extension but are never directories
const EXTENSIONLESS_FILES: &[&str] = &[
    "Makefile",
    "Dockerfile",
    "Procfile",
    "Gemfile",
    "Rakefile",
    "Jenkinsfile",
    "Vagrantfile",
    "Containerfile",
    "LICENSE",
    "README",
    "CHANGELOG",
];

/// Normalizes a raw path string into a relative path under the output root.
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect();
    let trimmed = unquoted.trim();

    if is_absolute(trimmed) {
        return final_segment(trimmed.trim_end_matches(['/', '\\'])).to_string();
    }

    let segments: Vec<&str> = trimmed
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    let mut relative = segments.join("/");
    // Keep a trailing separator so directory candidates like `src/` stay recognizable.
    if !relative.is_empty() && trimmed.ends_with(['/', '\\']) {
        relative.push('/');
    }
    relative
}

/// Returns the text after the last `/` or `\`.
pub fn final_segment(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// A path is treated as a file when its final segment contains a dot or is a
/// well-known extension-less file name such as `Makefile`.
pub fn looks_like_file(path: &str) -> bool {
    let segment = final_segment(path.trim());
    segment.contains('.') || EXTENSIONLESS_FILES.contains(&segment)
}

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let mut chars = path.chars();
    matches!((chars.next(), chars.next()), (Some(drive), Some(':')) if drive.is_ascii_alphabetic())
}
