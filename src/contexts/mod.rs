mod continuation;
mod materializer;
mod session;

pub use continuation::{
    ContinuationTemplate, DEFAULT_CONTINUATION_TEMPLATE, PromptRegistry, TemplateError,
};
pub use materializer::{MaterializeError, Materializer, WriteOutcome};
pub use session::{
    DEFAULT_MAX_RETRIES, GenerationSession, ResponseReport, RoundControl, RoundDecision,
    SessionSummary, StopReason, apply_response,
};
