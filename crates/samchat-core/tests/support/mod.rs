use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use samchat_core::{
    BubbleLayoutEngine, CompletionOrder, GenerationError, Generator, ResponderGateway,
    SpeechEngine, SpeechError, TurnOrchestrator,
};
use tokio::sync::{mpsc, oneshot};

type Reply = Result<String, GenerationError>;

/// Generator whose replies are released by the test, one call at a time
#[derive(Default)]
pub struct ScriptedGenerator {
    pending: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Reserve the reply slot for the next `generate` call
    pub fn expect_call(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        lock_unpoisoned(&self.pending).push_back(rx);
        tx
    }

    pub fn prompts(&self) -> Vec<String> {
        lock_unpoisoned(&self.prompts).clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        lock_unpoisoned(&self.prompts).push(prompt.to_string());
        let slot = lock_unpoisoned(&self.pending).pop_front();
        match slot {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GenerationError::Malformed("reply dropped".to_string()))),
            None => Err(GenerationError::Malformed("unexpected call".to_string())),
        }
    }
}

/// Speech engine that reports each utterance to the test
pub struct RecordingSpeech {
    spoken: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl SpeechEngine for RecordingSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let _ = self.spoken.send(text.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub orchestrator: TurnOrchestrator,
    pub generator: Arc<ScriptedGenerator>,
    pub spoken: mpsc::UnboundedReceiver<String>,
}

impl Harness {
    pub fn new(order: CompletionOrder) -> Self {
        let generator = Arc::new(ScriptedGenerator::default());
        let (spoken_tx, spoken) = mpsc::unbounded_channel();
        let gateway = ResponderGateway::new(
            generator.clone(),
            Arc::new(RecordingSpeech { spoken: spoken_tx }),
        );
        let mut orchestrator =
            TurnOrchestrator::open(gateway, BubbleLayoutEngine::terminal(), order);
        orchestrator.resize(80, 24);

        Self {
            orchestrator,
            generator,
            spoken,
        }
    }

    /// Receive the next completion and apply it, as the event loop would
    pub async fn pump(&mut self) {
        let completion = self
            .orchestrator
            .next_completion()
            .await
            .expect("completion channel closed");
        self.orchestrator.apply(completion);
    }

    pub async fn next_spoken(&mut self) -> String {
        self.spoken.recv().await.expect("speech channel closed")
    }

    pub fn texts(&self) -> Vec<String> {
        self.orchestrator
            .log()
            .turns()
            .iter()
            .map(|turn| turn.text.clone())
            .collect()
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
