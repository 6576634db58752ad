/// A fenced code region lifted out of a response, ready to be written.
///
/// Only produced when both the path and the content are non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub file_path: String,
    pub content: String,
}
