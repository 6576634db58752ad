mod code_block;
mod conversation;
mod file_registry;
mod generator;

pub use code_block::CodeBlock;
pub use conversation::{ConversationTurn, Role};
pub use file_registry::FileRegistry;
pub use generator::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationConfig, GenerationError,
    Generator,
};
