use std::str::SplitInclusive;

use super::fence_tag;
use crate::data::CodeBlock;
use crate::paths::final_segment;

/// Extensions that make a line ending in them a file-path hint
const HINT_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "html", "css", "scss", "json", "rs", "toml", "yaml", "yml",
    "md", "sh", "go", "java", "c", "h", "cpp", "hpp", "rb", "php", "sql", "txt",
];

const FILE_LABEL: &str = "File:";

/// Scanner state, advanced one line at a time.
#[derive(Debug)]
enum ScanState {
    /// Between fences, remembering the last line that looked like a file path
    Outside { hint: Option<String> },
    /// Between an opening fence and the next fence line
    Inside {
        file_path: Option<String>,
        content: String,
    },
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState::Outside { hint: None }
    }
}

impl ScanState {
    /// `line` is one raw line including its `\n` terminator, if any.
    fn advance(self, line: &str) -> (ScanState, Option<CodeBlock>) {
        let bare = line.strip_suffix('\n').unwrap_or(line);
        let bare = bare.strip_suffix('\r').unwrap_or(bare);

        match (self, fence_tag(bare)) {
            (ScanState::Outside { hint }, Some(tag)) => {
                let file_path = hint.or_else(|| default_path(tag));
                let next = ScanState::Inside {
                    file_path,
                    content: String::new(),
                };
                (next, None)
            }
            (ScanState::Outside { hint }, None) => {
                let hint = path_hint(bare).or(hint);
                (ScanState::Outside { hint }, None)
            }
            // Any fence line closes the block, even one meant as content.
            (ScanState::Inside { file_path, content }, Some(_)) => {
                let block = match file_path {
                    Some(file_path) if !file_path.trim().is_empty() && !content.trim().is_empty() => {
                        Some(CodeBlock { file_path, content })
                    }
                    _ => {
                        tracing::debug!("dropping code block without a path or content");
                        None
                    }
                };
                (ScanState::Outside { hint: None }, block)
            }
            (
                ScanState::Inside {
                    file_path,
                    mut content,
                },
                None,
            ) => {
                // Verbatim, so `\r\n` endings survive.
                content.push_str(line);
                if !line.ends_with('\n') {
                    content.push('\n');
                }
                (ScanState::Inside { file_path, content }, None)
            }
        }
    }
}

/// Yields the fenced code blocks of a response in source order.
///
/// A block still open when the text ends is dropped.
pub struct CodeBlockExtractor<'a> {
    lines: SplitInclusive<'a, char>,
    state: ScanState,
}

impl<'a> CodeBlockExtractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n'),
            state: ScanState::default(),
        }
    }
}

impl Iterator for CodeBlockExtractor<'_> {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<CodeBlock> {
        for line in self.lines.by_ref() {
            let (next, emitted) = std::mem::take(&mut self.state).advance(line);
            self.state = next;
            if emitted.is_some() {
                return emitted;
            }
        }
        None
    }
}

/// Collects every complete code block in `text`.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    CodeBlockExtractor::new(text).collect()
}

/// Returns the cleaned path when `line` looks like it names the next block's file.
fn path_hint(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let cleaned = strip_markdown(&trimmed.replace(FILE_LABEL, ""));

    let labelled = trimmed.contains(FILE_LABEL);
    // The line itself must end in the extension; prose such as "main.py:" does not.
    let known_extension = trimmed
        .trim_end_matches(['`', '*'])
        .rsplit_once('.')
        .is_some_and(|(_, ext)| HINT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    let dotted_path = trimmed.contains(['/', '\\']) && final_segment(trimmed).contains('.');

    if (labelled || known_extension || dotted_path) && !cleaned.is_empty() {
        Some(cleaned)
    } else {
        None
    }
}

fn strip_markdown(text: &str) -> String {
    text.trim()
        .trim_start_matches(['#', '*', '-', '>', '`', ' '])
        .trim_end_matches([':', '*', '`', ' '])
        .trim()
        .to_string()
}

fn default_path(tag: &str) -> Option<String> {
    if tag.is_empty() {
        return None;
    }
    let extension = match tag.to_ascii_lowercase().as_str() {
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        _ => tag,
    };
    Some(format!("default.{}", extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(path: &str, content: &str) -> CodeBlock {
        CodeBlock {
            file_path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_hint_line_names_the_block() {
        let text = "Create the app:\nsrc/app.py\n```python\nimport os\nprint(os.getcwd())\n```\n";
        assert_eq!(
            extract_code_blocks(text),
            vec![block("src/app.py", "import os\nprint(os.getcwd())\n")]
        );
    }

    #[test]
    fn test_file_label_hint() {
        let text = "File: main.go\n```go\npackage main\n```";
        assert_eq!(extract_code_blocks(text), vec![block("main.go", "package main\n")]);
    }

    #[test]
    fn test_markdown_decorated_hints() {
        let text = "### `src/lib.rs`\n```rust\npub fn f() {}\n```\n**config/settings.toml**:\n```toml\nkey = 1\n```\n";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks[0].file_path, "src/lib.rs");
        assert_eq!(blocks[1].file_path, "config/settings.toml");
    }

    #[test]
    fn test_default_names_from_language_tag() {
        let text = "```python\na = 1\n```\n```javascript\nlet a = 1;\n```\n```rust\nlet a = 1;\n```\n";
        let paths: Vec<String> = extract_code_blocks(text).into_iter().map(|b| b.file_path).collect();
        assert_eq!(paths, vec!["default.py", "default.js", "default.rust"]);
    }

    #[test]
    fn test_block_without_path_is_dropped() {
        let text = "Some prose.\n```\necho hi\n```\n";
        assert!(extract_code_blocks(text).is_empty());
    }

    #[test]
    fn test_blank_block_is_dropped() {
        let text = "app.py\n```python\n   \n\n```\n";
        assert!(extract_code_blocks(text).is_empty());
    }

    #[test]
    fn test_hint_is_consumed_by_one_block() {
        let text = "src/app.py\n```python\nx = 1\n```\n```\ny = 2\n```\n";
        assert_eq!(extract_code_blocks(text), vec![block("src/app.py", "x = 1\n")]);
    }

    #[test]
    fn test_hint_persists_across_prose() {
        let text = "src/app.py\n\nThis file starts the server.\n```\nrun()\n```\n";
        assert_eq!(extract_code_blocks(text), vec![block("src/app.py", "run()\n")]);
    }

    #[test]
    fn test_latest_hint_wins() {
        let text = "src/old.py\nFile: src/new.py\n```python\nx = 1\n```\n";
        assert_eq!(extract_code_blocks(text)[0].file_path, "src/new.py");
    }

    #[test]
    fn test_inner_fence_closes_block() {
        let text = "README.md\n```markdown\n# Title\n```bash\nmake\n```\n```\n";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks, vec![block("README.md", "# Title\n")]);
    }

    #[test]
    fn test_unclosed_block_is_dropped() {
        let text = "src/app.py\n```python\nprint(1)\n";
        assert!(extract_code_blocks(text).is_empty());
    }

    #[test]
    fn test_content_keeps_indentation_verbatim() {
        let text = "app.py\n```python\ndef f():\n    return 1\n\n```\n";
        assert_eq!(extract_code_blocks(text)[0].content, "def f():\n    return 1\n\n");
    }

    #[test]
    fn test_blocks_keep_source_order() {
        let text = "b.py\n```\nb\n```\na.py\n```\na\n```\nc.py\n```\nc\n```\n";
        let paths: Vec<String> = extract_code_blocks(text).into_iter().map(|b| b.file_path).collect();
        assert_eq!(paths, vec!["b.py", "a.py", "c.py"]);
    }

    #[test]
    fn test_prose_ending_in_colon_falls_back_to_language_tag() {
        let text = "Here is the updated main.py:\n```python\nprint(1)\n```\n";
        assert_eq!(extract_code_blocks(text), vec![block("default.py", "print(1)\n")]);
    }

    #[test]
    fn test_crlf_content_is_kept_verbatim() {
        let text = "app.py\r\n```python\r\na = 1\r\nb = 2\r\n```\r\n";
        assert_eq!(extract_code_blocks(text), vec![block("app.py", "a = 1\r\nb = 2\r\n")]);
    }

    #[test]
    fn test_dotted_path_with_unlisted_extension() {
        let text = "config/app.conf\n```\nk=v\n```\n";
        assert_eq!(extract_code_blocks(text), vec![block("config/app.conf", "k=v\n")]);
    }

    #[test]
    fn test_dot_only_in_parent_segment_is_not_a_hint() {
        assert_eq!(path_hint("lib.d/readme"), None);
        assert!(extract_code_blocks("lib.d/readme\n```\nx\n```\n").is_empty());
    }

    #[test]
    fn test_prose_without_path_is_not_a_hint() {
        assert_eq!(path_hint("Here is the implementation"), None);
        assert_eq!(path_hint("File:"), None);
        assert_eq!(path_hint("- utils/helpers.py"), Some("utils/helpers.py".to_string()));
    }
}
