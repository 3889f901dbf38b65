//! Speech output.
//!
//! The speech device is one shared resource. Every utterance goes through a
//! single [`SpeechQueue`] worker task, which plays them one at a time, so
//! playback never overlaps and never runs on the interaction task. Dropping
//! the queue stops whatever is playing.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::state::PendingWork;

/// A text-to-speech device. `speak` resolves once the utterance has finished
/// playing; dropping the future cuts playback short.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Used when speech is disabled or no synthesizer exists
pub struct SilentSpeech;

#[async_trait]
impl SpeechEngine for SilentSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        debug!(chars = text.chars().count(), "speech disabled, skipping utterance");
        Ok(())
    }
}

/// Drives a command-line synthesizer, writing the text to its stdin
#[derive(Debug, Clone)]
pub struct SystemSpeech {
    program: PathBuf,
    args: Vec<String>,
}

impl SystemSpeech {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` list as stored in the config
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program, args.to_vec()))
    }

    /// Find the platform synthesizer on `PATH`
    pub fn detect() -> Option<Self> {
        CANDIDATES.iter().find_map(|(program, args)| {
            which::which(program).ok().map(|path| {
                info!(synthesizer = %path.display(), "using system speech");
                Self::new(path, args.iter().map(|a| a.to_string()).collect())
            })
        })
    }
}

type Candidate = (&'static str, &'static [&'static str]);

// `say` reads stdin when given no message
#[cfg(target_os = "macos")]
const CANDIDATES: &[Candidate] = &[("say", &[])];

#[cfg(target_os = "windows")]
const CANDIDATES: &[Candidate] = &[(
    "powershell",
    &[
        "-NoProfile",
        "-Command",
        "Add-Type -AssemblyName System.Speech; \
         (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak([Console]::In.ReadToEnd())",
    ],
)];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CANDIDATES: &[Candidate] = &[
    ("espeak-ng", &["--stdin"]),
    ("espeak", &["--stdin"]),
    ("spd-say", &["--wait", "-e"]),
];

#[async_trait]
impl SpeechEngine for SystemSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SpeechError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin.write_all(text.as_bytes()).await;
            // Closing stdin is the synthesizer's EOF
            drop(stdin);
            if let Err(e) = written {
                // Kill and reap before reporting, the synth may still be running
                let _ = child.kill().await;
                return Err(SpeechError::Io(e));
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(SpeechError::Failed(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}

struct Utterance {
    work: PendingWork,
    text: String,
}

/// FIFO of utterances in front of one speech engine
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<Utterance>,
    worker: JoinHandle<()>,
}

impl SpeechQueue {
    /// Start the queue worker. Must be called inside a tokio runtime.
    pub fn spawn(engine: Arc<dyn SpeechEngine>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Utterance>();

        let worker = tokio::spawn(async move {
            while let Some(Utterance { work, text }) = rx.recv().await {
                match engine.speak(&text).await {
                    Ok(()) => {
                        debug!(sequence = work.triggering_sequence, "utterance finished")
                    }
                    Err(e) => {
                        warn!(sequence = work.triggering_sequence, error = %e, "speech failed")
                    }
                }
            }
        });

        Self { tx, worker }
    }

    /// Queue `text` for playback after everything already queued
    pub fn enqueue(&self, triggering_sequence: u64, text: impl Into<String>) {
        let utterance = Utterance {
            work: PendingWork::speak(triggering_sequence),
            text: text.into(),
        };
        if self.tx.send(utterance).is_err() {
            warn!(sequence = triggering_sequence, "speech worker gone, dropping utterance");
        }
    }
}

impl Drop for SpeechQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
