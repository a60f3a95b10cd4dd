//! Structured progress events (spec §4.8 step 5), delivered over an
//! unbounded channel in the same style as the status-update channel used
//! during process startup.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TranscriptFind,
    Download,
    Transcribe,
    Summarize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::TranscriptFind => "transcript_find",
            Stage::Download => "download",
            Stage::Transcribe => "transcribe",
            Stage::Summarize => "summarize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Started,
    Retrying,
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub podcast: String,
    pub episode_title: String,
    pub state: State,
    pub attempt: u32,
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn new(stage: Stage, podcast: impl Into<String>, episode_title: impl Into<String>, state: State, attempt: u32) -> Self {
        Self {
            stage,
            podcast: podcast.into(),
            episode_title: episode_title.into(),
            state,
            attempt,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel_in_order() {
        let (tx, mut rx) = channel();
        tx.send(ProgressEvent::new(Stage::Download, "Pod", "Ep 1", State::Started, 1)).unwrap();
        tx.send(
            ProgressEvent::new(Stage::Download, "Pod", "Ep 1", State::Failed, 1).with_error("network error"),
        )
        .unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.state, State::Started);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.state, State::Failed);
        assert_eq!(second.error.as_deref(), Some("network error"));

        assert!(rx.recv().await.is_none());
    }
}
