//! UI-agnostic conversation state types
//!
//! These types are shared between the orchestrator, the message view and
//! whatever front end draws the bubbles. None of them depend on a UI framework.

use serde::{Deserialize, Serialize};

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    /// Label used when rendering the turn into a prompt
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Bot => "Bot",
        }
    }
}

/// One message in the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    Generate,
    Speak,
}

/// A background operation in flight, keyed by the turn that triggered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWork {
    pub kind: WorkKind,
    pub triggering_sequence: u64,
}

impl PendingWork {
    pub fn generate(triggering_sequence: u64) -> Self {
        Self {
            kind: WorkKind::Generate,
            triggering_sequence,
        }
    }

    pub fn speak(triggering_sequence: u64) -> Self {
        Self {
            kind: WorkKind::Speak,
            triggering_sequence,
        }
    }
}
