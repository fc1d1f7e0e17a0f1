use serde::Serialize;
use tokio::sync::mpsc;

use crate::model::{AgentLog, AgentLogEntry};

/// Progress events streamed from a build to whatever is presenting it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum BuildEvent {
    #[serde(rename_all = "camelCase")]
    StageStarted {
        stage: String,
        description: String,
        stage_index: usize,
        total_stages: usize,
    },
    #[serde(rename_all = "camelCase")]
    Progress { percent: u8, status: String },
    Log(AgentLogEntry),
    #[serde(rename_all = "camelCase")]
    StageCompleted { stage: String, files: usize },
    #[serde(rename_all = "camelCase")]
    Error { stage: String, message: String },
    #[serde(rename_all = "camelCase")]
    Finished { files: usize },
}

/// Owns the agent log and the progress value for one build and forwards
/// both to an optional event channel.
///
/// Sending never blocks; a closed receiver just means nobody is watching.
pub struct Reporter {
    tx: Option<mpsc::UnboundedSender<BuildEvent>>,
    log: AgentLog,
    percent: u8,
}

impl Reporter {
    pub fn new(tx: Option<mpsc::UnboundedSender<BuildEvent>>) -> Self {
        Self {
            tx,
            log: AgentLog::new(),
            percent: 0,
        }
    }

    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    /// Appends an agent log entry and streams it.
    pub fn log(&mut self, source: &str, message: &str) {
        tracing::debug!(source, "{message}");
        let entry = self.log.push(source, message);
        self.emit(BuildEvent::Log(entry));
    }

    /// Reports progress. The value never goes down and is capped at 100.
    pub fn progress(&mut self, percent: u8, status: &str) {
        self.percent = percent.clamp(self.percent, 100);
        self.emit(BuildEvent::Progress {
            percent: self.percent,
            status: status.to_string(),
        });
    }

    pub fn log_entries(&self) -> &[AgentLogEntry] {
        self.log.entries()
    }
}
