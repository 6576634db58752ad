use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{ConversationTurn, GenerationConfig, GenerationError, Generator};

pub const DEFAULT_CACHE_FOLDER: &str = ".accrete";

/// A turn as it is stored and compared; timestamps are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredTurn {
    role: String,
    content: String,
}

/// One replayable exchange, stored as `{folder}/{settings_hash}/{request_hash}.json`.
///
/// The full request is kept next to the response so an entry is only replayed
/// for the exact request it answered.
#[derive(Debug, Serialize, Deserialize)]
struct ReplayEntry {
    request: Vec<StoredTurn>,
    response: String,
    stored_at: DateTime<Utc>,
}

/// Wraps a generator with an on-disk replay cache.
///
/// Responses are namespaced by the generation settings, so changing the
/// model, token budget or temperature never replays an old answer.
pub struct CachedGenerator<G: Generator> {
    inner: G,
    folder: PathBuf,
}

impl<G: Generator> CachedGenerator<G> {
    /// `folder` defaults to ".accrete" when `None`.
    pub fn new(inner: G, folder: Option<PathBuf>) -> Self {
        Self {
            inner,
            folder: folder.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FOLDER)),
        }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }

    fn entry_path(&self, config: &GenerationConfig, request: &[StoredTurn]) -> PathBuf {
        self.folder
            .join(settings_hash(config))
            .join(format!("{}.json", request_hash(request)))
    }
}

impl<G: Generator> Generator for CachedGenerator<G> {
    fn generate(
        &mut self,
        transcript: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let request: Vec<StoredTurn> = transcript
            .iter()
            .map(|turn| StoredTurn {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            })
            .collect();
        let path = self.entry_path(config, &request);

        if let Some(response) = replay(&path, &request) {
            tracing::debug!("Replaying cached response {}", path.display());
            return Ok(response);
        }

        let response = self.inner.generate(transcript, config)?;
        store(&path, request, &response);
        Ok(response)
    }
}

/// Misses on absent, unreadable or mismatched entries.
fn replay(path: &Path, request: &[StoredTurn]) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let entry: ReplayEntry = match serde_json::from_str(&raw) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
            return None;
        }
    };

    if entry.request != request {
        tracing::warn!(
            "Cache entry {} was stored for a different request, ignoring it",
            path.display()
        );
        return None;
    }
    Some(entry.response)
}

/// Never fails the round; problems are only logged.
fn store(path: &Path, request: Vec<StoredTurn>, response: &str) {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!("Failed to create cache directory {}: {}", dir.display(), e);
            return;
        }
    }

    let entry = ReplayEntry {
        request,
        response: response.to_string(),
        stored_at: Utc::now(),
    };
    let written = serde_json::to_string_pretty(&entry)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        tracing::warn!("Failed to write cache entry {}: {}", path.display(), e);
    }
}

fn settings_hash(config: &GenerationConfig) -> String {
    let composite = format!("{}:{}:{}", config.model, config.max_tokens, config.temperature);
    hex::encode(Sha256::digest(composite.as_bytes()))
}

fn request_hash(request: &[StoredTurn]) -> String {
    let mut hasher = Sha256::new();
    for turn in request {
        for part in [&turn.role, &turn.content] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingGenerator {
        calls: usize,
    }

    impl Generator for CountingGenerator {
        fn generate(
            &mut self,
            transcript: &[ConversationTurn],
            _config: &GenerationConfig,
        ) -> Result<String, GenerationError> {
            self.calls += 1;
            match transcript.last() {
                Some(turn) if turn.content == "fail" => {
                    Err(GenerationError::Network("offline".to_string()))
                }
                Some(turn) => Ok(format!("reply to {}", turn.content)),
                None => Ok(String::new()),
            }
        }
    }

    fn cached(dir: &tempfile::TempDir) -> CachedGenerator<CountingGenerator> {
        CachedGenerator::new(CountingGenerator { calls: 0 }, Some(dir.path().to_path_buf()))
    }

    fn stored(content: &str) -> Vec<StoredTurn> {
        vec![StoredTurn {
            role: "user".to_string(),
            content: content.to_string(),
        }]
    }

    #[test]
    fn test_second_identical_request_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let config = GenerationConfig::default();

        let first = generator.generate(&[ConversationTurn::user("hi")], &config).unwrap();
        // A fresh turn has a new timestamp but the same entry.
        let second = generator.generate(&[ConversationTurn::user("hi")], &config).unwrap();

        assert_eq!(first, "reply to hi");
        assert_eq!(second, first);
        assert_eq!(generator.into_inner().calls, 1);
    }

    #[test]
    fn test_entry_records_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let config = GenerationConfig::default();
        generator.generate(&[ConversationTurn::user("hi")], &config).unwrap();

        let path = generator.entry_path(&config, &stored("hi"));
        let entry: ReplayEntry = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(entry.request, stored("hi"));
        assert_eq!(entry.response, "reply to hi");
    }

    #[test]
    fn test_entry_for_another_request_is_not_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let config = GenerationConfig::default();

        // Plant an entry under this request's name that answered something else.
        let path = generator.entry_path(&config, &stored("hi"));
        store(&path, stored("something else"), "stale answer");

        let reply = generator.generate(&[ConversationTurn::user("hi")], &config).unwrap();
        assert_eq!(reply, "reply to hi");
        assert_eq!(generator.into_inner().calls, 1);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let config = GenerationConfig::default();
        let path = generator.entry_path(&config, &stored("hi"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert_eq!(
            generator.generate(&[ConversationTurn::user("hi")], &config).unwrap(),
            "reply to hi"
        );
        assert_eq!(generator.into_inner().calls, 1);
    }

    #[test]
    fn test_settings_change_misses() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let hot = GenerationConfig {
            temperature: 0.9,
            ..GenerationConfig::default()
        };

        generator.generate(&[ConversationTurn::user("hi")], &GenerationConfig::default()).unwrap();
        generator.generate(&[ConversationTurn::user("hi")], &hot).unwrap();

        assert_eq!(generator.into_inner().calls, 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = cached(&dir);
        let config = GenerationConfig::default();

        assert!(generator.generate(&[ConversationTurn::user("fail")], &config).is_err());
        assert!(generator.generate(&[ConversationTurn::user("fail")], &config).is_err());
        assert_eq!(generator.into_inner().calls, 2);
    }

    #[test]
    fn test_unwritable_folder_still_returns_the_response() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut generator = CachedGenerator::new(CountingGenerator { calls: 0 }, Some(blocker));

        let reply = generator
            .generate(&[ConversationTurn::user("hi")], &GenerationConfig::default())
            .unwrap();
        assert_eq!(reply, "reply to hi");
    }

    #[test]
    fn test_request_hash_depends_on_roles_and_content() {
        let user = stored("x");
        let assistant = vec![StoredTurn {
            role: "assistant".to_string(),
            content: "x".to_string(),
        }];
        assert_ne!(request_hash(&user), request_hash(&assistant));
        assert_ne!(request_hash(&user), request_hash(&stored("y")));
        assert_eq!(request_hash(&user).len(), 64);
    }
}
