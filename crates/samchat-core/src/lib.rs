pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod orchestrator;
pub mod provider;
pub mod speech;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use ai::{GenerationOptions, Generator};
pub use config::Config;
pub use conversation::ConversationLog;
pub use error::{ConfigError, GenerationError, SpeechError};
pub use gateway::ResponderGateway;
pub use layout::{BubbleGeometry, BubbleLayout, BubbleLayoutEngine, CellMeasure, Side, TextMeasure};
pub use orchestrator::{Completion, CompletionOrder, SessionState, TurnOrchestrator};
pub use provider::Provider;
pub use speech::{SilentSpeech, SpeechEngine, SpeechQueue, SystemSpeech};
pub use state::{PendingWork, Speaker, Turn, WorkKind};
pub use view::{Bubble, ScrollingMessageView};
