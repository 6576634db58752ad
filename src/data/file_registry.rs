use indexmap::IndexMap;

/// Files produced during a session, in the order they were first written.
///
/// Maps a relative path to a short summary of its content. Lives only as long
/// as the session and is used to describe progress in the next prompt; write
/// decisions always look at the file on disk instead.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    entries: IndexMap<String, String>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a written file. Re-registering a path updates its summary but
    /// keeps its original position.
    pub fn register(&mut self, path: &str, content: &str) {
        let summary = format!("File created: {} characters", content.chars().count());
        self.entries.insert(path.to_string(), summary);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders one `path: summary` line per entry.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(path, summary)| format!("{}: {}", path, summary))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
