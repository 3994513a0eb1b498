//! Chat core: turns one customer message into one reply.
//!
//! Submodules:
//! - `types`: Message, Conversation and the per-turn values
//! - `gateway`: the Model and Data Gateway seams, plus the timeout wrapper
//! - `sanitizer`: fence stripping and classifier-payload parsing
//! - `prompts`: prompt text for the three model calls
//! - `classifier`, `synthesizer`, `executor`, `summarizer`: one step each
//! - `orchestrator`: the per-turn state machine and the session loop

pub mod classifier;
pub mod executor;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod sanitizer;
pub mod summarizer;
pub mod synthesizer;
pub mod types;

pub use gateway::{Bounded, DataGateway, ModelGateway};
pub use orchestrator::{is_end_session, SessionSettings, TurnOrchestrator, TurnPath, TurnReport, TurnState};
pub use types::{ClassificationResult, Conversation, ExecutionOutcome, Message, MessageRole, SqlCandidate};
