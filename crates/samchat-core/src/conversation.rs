//! Append-only conversation history

use crate::state::{Speaker, Turn};

/// The ordered record of every turn in a session.
///
/// Sequence numbers are exactly `0..len()` in storage order. Appending is the
/// only way to change the log, so the prompt built from it is always a
/// reproducible function of what has been appended so far.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new turn under the next sequence number and return it
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> &Turn {
        let sequence = self.turns.len() as u64;
        self.turns.push(Turn {
            speaker,
            text: text.into(),
            sequence,
        });
        &self.turns[self.turns.len() - 1]
    }

    /// Render the whole history as `User: ...` / `Bot: ...` lines followed by
    /// a `Bot:` cue for the next reply
    pub fn build_prompt(&self) -> String {
        let mut prompt = String::new();
        for turn in &self.turns {
            prompt.push_str(turn.speaker.prompt_label());
            prompt.push_str(": ");
            prompt.push_str(&turn.text);
            prompt.push('\n');
        }
        prompt.push_str(Speaker::Bot.prompt_label());
        prompt.push(':');
        prompt
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, sequence: u64) -> Option<&Turn> {
        usize::try_from(sequence)
            .ok()
            .and_then(|index| self.turns.get(index))
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
