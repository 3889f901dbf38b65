//! Turn orchestration.
//!
//! [`TurnOrchestrator`] lives on the interaction task and is the only thing
//! that touches the conversation log and the message view. Generation runs on
//! spawned tasks that own nothing but a prompt snapshot and a channel sender;
//! their results come back as [`Completion`]s which the interaction loop hands
//! to [`TurnOrchestrator::apply`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::conversation::ConversationLog;
use crate::error::GenerationError;
use crate::gateway::ResponderGateway;
use crate::layout::BubbleLayoutEngine;
use crate::state::{PendingWork, Speaker, Turn};
use crate::view::ScrollingMessageView;

pub const BOT_NAME: &str = "Sam";
pub const WELCOME_MESSAGE: &str = "Hi, I am Sam. How can I help you?";
pub const FAREWELL_MESSAGE: &str = "Conversation ended. Goodbye!";
pub const FAREWELL_DELAY: Duration = Duration::from_millis(2000);

/// When a bot reply is appended relative to other in-flight replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionOrder {
    /// Append each reply as soon as it arrives
    #[default]
    Arrival,
    /// Hold a reply until every earlier submission's reply has been appended
    Submission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingGeneration { outstanding: usize },
    Closing { deadline: Instant },
}

/// Result of one background generation, posted back to the interaction task
#[derive(Debug)]
pub struct Completion {
    pub work: PendingWork,
    pub outcome: Result<String, GenerationError>,
}

pub struct TurnOrchestrator {
    log: ConversationLog,
    view: ScrollingMessageView,
    engine: BubbleLayoutEngine,
    gateway: ResponderGateway,
    order: CompletionOrder,
    in_flight: BTreeSet<u64>,
    held: BTreeMap<u64, Completion>,
    tasks: Vec<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    closing_at: Option<Instant>,
}

impl TurnOrchestrator {
    /// Start a session: the welcome turn is appended and spoken right away
    pub fn open(
        gateway: ResponderGateway,
        engine: BubbleLayoutEngine,
        order: CompletionOrder,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut orchestrator = Self {
            log: ConversationLog::new(),
            view: ScrollingMessageView::default(),
            engine,
            gateway,
            order,
            in_flight: BTreeSet::new(),
            held: BTreeMap::new(),
            tasks: Vec::new(),
            completions_tx,
            completions_rx,
            closing_at: None,
        };

        let welcome = orchestrator.append_turn(Speaker::Bot, WELCOME_MESSAGE.to_string());
        orchestrator.gateway.speak(welcome.sequence, &welcome.text);
        orchestrator
    }

    /// Log and render the user's turn, then ask for a reply in the background.
    ///
    /// Returns the new turn's sequence, or `None` when the input is blank or
    /// the session is closing.
    pub fn submit(&mut self, input: &str) -> Option<u64> {
        if self.closing_at.is_some() {
            debug!("session closing, ignoring submission");
            return None;
        }
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let turn = self.append_turn(Speaker::User, text.to_string());
        let prompt = self.log.build_prompt();
        let work = PendingWork::generate(turn.sequence);
        self.in_flight.insert(turn.sequence);

        info!(
            sequence = turn.sequence,
            kind = ?work.kind,
            prompt_chars = prompt.len(),
            outstanding = self.in_flight.len(),
            "dispatching generation"
        );

        let generator = self.gateway.generator();
        let tx = self.completions_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let outcome = generator.generate(&prompt).await;
            if tx.send(Completion { work, outcome }).is_err() {
                debug!(
                    sequence = work.triggering_sequence,
                    "session closed before reply was delivered"
                );
            }
        }));

        Some(turn.sequence)
    }

    /// Wait for the next background result. Pends forever while nothing is
    /// in flight, so it is safe to use as a `select!` branch.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Apply a background result on the interaction task
    pub fn apply(&mut self, completion: Completion) {
        let sequence = completion.work.triggering_sequence;
        self.tasks.retain(|task| !task.is_finished());

        if !self.in_flight.remove(&sequence) {
            warn!(sequence, "completion for unknown submission, ignoring");
            return;
        }
        if self.closing_at.is_some() {
            info!(sequence, "session closing, discarding late reply");
            return;
        }

        match self.order {
            CompletionOrder::Arrival => self.deliver(completion),
            CompletionOrder::Submission => {
                self.held.insert(sequence, completion);
                while let Some(entry) = self.held.first_entry() {
                    let blocked = self
                        .in_flight
                        .first()
                        .is_some_and(|&earliest| earliest < *entry.key());
                    if blocked {
                        debug!(sequence = *entry.key(), "holding reply for earlier submission");
                        break;
                    }
                    let completion = entry.remove();
                    self.deliver(completion);
                }
            }
        }
    }

    /// Append the farewell turn, speak it, and start the shutdown timer.
    /// Returns the shutdown deadline the first time, `None` afterwards.
    pub fn end_chat(&mut self) -> Option<Instant> {
        if self.closing_at.is_some() {
            return None;
        }

        let farewell = self.append_turn(Speaker::Bot, FAREWELL_MESSAGE.to_string());
        self.gateway.speak(farewell.sequence, &farewell.text);

        let deadline = Instant::now() + FAREWELL_DELAY;
        self.closing_at = Some(deadline);
        info!(turns = self.log.len(), "chat ended, closing after delay");
        Some(deadline)
    }

    pub fn state(&self) -> SessionState {
        if let Some(deadline) = self.closing_at {
            return SessionState::Closing { deadline };
        }
        let outstanding = self.in_flight.len() + self.held.len();
        if outstanding == 0 {
            SessionState::Idle
        } else {
            SessionState::AwaitingGeneration { outstanding }
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state(), SessionState::AwaitingGeneration { .. })
    }

    pub fn shutdown_deadline(&self) -> Option<Instant> {
        self.closing_at
    }

    /// Re-measure every bubble for a new chat area
    pub fn resize(&mut self, width: u16, height: u16) {
        self.view.on_resize(width, height, &self.engine);
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn view(&self) -> &ScrollingMessageView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScrollingMessageView {
        &mut self.view
    }

    fn deliver(&mut self, completion: Completion) {
        let sequence = completion.work.triggering_sequence;
        let outcome = completion.outcome.and_then(|reply| {
            let reply = reply.trim();
            if reply.is_empty() {
                Err(GenerationError::Malformed("empty reply".to_string()))
            } else {
                Ok(reply.to_string())
            }
        });
        let text = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sequence, error = %e, "generation failed");
                format!("Sorry, I encountered an error: {}", e)
            }
        };

        let reply = self.append_turn(Speaker::Bot, text);
        debug!(sequence = reply.sequence, triggered_by = sequence, "reply appended");
        self.gateway.speak(reply.sequence, &reply.text);
    }

    fn append_turn(&mut self, speaker: Speaker, text: String) -> Turn {
        let turn = self.log.append(speaker, text).clone();
        let (width, _) = self.view.viewport();
        let layout = self
            .engine
            .layout(&turn.text, self.engine.max_width_for(width), speaker);
        self.view.append(&turn, layout);
        turn
    }
}

impl Drop for TurnOrchestrator {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Resolves at `deadline`, or never when there is none
pub async fn wait_for_shutdown(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
