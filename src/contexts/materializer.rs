use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::data::FileRegistry;
use crate::paths::{looks_like_file, sanitize};

/// Result of a successful `write_file` call, carrying the sanitized path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(String),
    /// The file on disk already had this exact content
    Unchanged(String),
}

impl WriteOutcome {
    pub fn path(&self) -> &str {
        match self {
            WriteOutcome::Written(path) | WriteOutcome::Unchanged(path) => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteOutcome::Written(path) => write!(f, "Successfully wrote file: {}", path),
            WriteOutcome::Unchanged(path) => {
                write!(f, "File {} already exists with same content, skipping.", path)
            }
        }
    }
}

/// Errors that can occur while writing a single file
#[derive(Debug)]
pub enum MaterializeError {
    /// Nothing usable was left of the path after sanitizing
    EmptyPath(String),
    Io { path: String, source: io::Error },
}

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MaterializeError::EmptyPath(raw) => {
                write!(f, "Error writing file '{}': path is empty after sanitizing", raw)
            }
            MaterializeError::Io { path, source } => {
                write!(f, "Error writing file {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for MaterializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaterializeError::EmptyPath(_) => None,
            MaterializeError::Io { source, .. } => Some(source),
        }
    }
}

/// Materializer context writes extracted directories and files under one
/// output root and keeps the registry of files it has written.
///
/// Nothing is ever read or written outside the root, and nothing is deleted.
#[derive(Debug)]
pub struct Materializer {
    root: PathBuf,
    registry: FileRegistry,
}

impl Materializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: FileRegistry::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// Creates the output root. Returns `true` when it did not exist before.
    pub fn prepare(&self) -> io::Result<bool> {
        if self.root.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.root)?;
        Ok(true)
    }

    /// Writes `content` to `raw_path` under the root.
    ///
    /// Identical on-disk content is left untouched and reported as
    /// `Unchanged`; only actual writes are registered.
    pub fn write_file(&mut self, raw_path: &str, content: &str) -> Result<WriteOutcome, MaterializeError> {
        let path = sanitize(raw_path);
        if path.is_empty() {
            return Err(MaterializeError::EmptyPath(raw_path.to_string()));
        }

        let full_path = self.root.join(&path);
        let io_error = |source: io::Error| MaterializeError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        if full_path.is_file() {
            let existing = fs::read(&full_path).map_err(io_error)?;
            if existing == content.as_bytes() {
                tracing::debug!("{} unchanged, skipping write", path);
                return Ok(WriteOutcome::Unchanged(path));
            }
        }

        fs::write(&full_path, content).map_err(io_error)?;
        self.registry.register(&path, content);
        tracing::debug!("wrote {} ({} bytes)", path, content.len());

        Ok(WriteOutcome::Written(path))
    }

    /// Creates every candidate directory under the root.
    ///
    /// Candidates that look like files are skipped. Returns one message per
    /// attempted directory; failures are reported, not raised.
    pub fn create_directories(&self, candidates: &[String]) -> Vec<String> {
        let mut messages = Vec::new();

        for candidate in candidates {
            if looks_like_file(candidate) {
                tracing::debug!("skipping directory candidate {} (looks like a file)", candidate);
                continue;
            }

            let dir = sanitize(candidate);
            if dir.is_empty() {
                continue;
            }

            match fs::create_dir_all(self.root.join(&dir)) {
                Ok(()) => messages.push(format!("Created directory: {}", dir)),
                Err(e) => {
                    tracing::warn!("Failed to create directory {}: {}", dir, e);
                    messages.push(format!("Error creating directory {}: {}", dir, e));
                }
            }
        }

        messages
    }
}
