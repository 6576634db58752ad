//! Implementations of the `Generator` collaborator.

mod anthropic;
mod cached;

pub use anthropic::AnthropicGenerator;
pub use cached::{CachedGenerator, DEFAULT_CACHE_FOLDER};
