use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::events::{Message, MessageSender};
use crate::sources::BoxedSource;

/// Runs a sample source on its own task, feeding the monitor's channel
pub struct SourceRunner {
    source: BoxedSource,
    tx: mpsc::Sender<Message>,
}

impl SourceRunner {
    pub fn new(source: BoxedSource, tx: mpsc::Sender<Message>) -> Self {
        Self { source, tx }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Start the source. The monitor is told the source is complete whether
    /// it finishes cleanly or fails.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        let Self { source, tx } = self;
        let name = source.name().to_string();

        tokio::spawn(async move {
            info!(source = %name, "source started");
            let result = source.run(tx.clone()).await;

            match &result {
                Ok(()) => info!(source = %name, "source complete"),
                Err(err) => {
                    error!(source = %name, %err, "source failed");
                    _ = tx.source_error(format!("{name}: {err}")).await;
                }
            }
            _ = tx.source_complete().await;

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::lines::LineSource;

    #[tokio::test]
    async fn test_spawn_signals_completion() {
        let input: &'static [u8] = b"1\n2\n";
        let (tx, mut rx) = mpsc::channel(16);
        let runner = SourceRunner::new(Box::new(LineSource::new("test", input)), tx);
        assert_eq!(runner.name(), "test");

        runner.spawn().await.unwrap().unwrap();

        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.last(), Some(&Message::SourceComplete));
    }
}
