use std::time::Instant;

use async_trait::async_trait;
use extend::ext;
use tokio::sync::mpsc::{
    self,
    error::{SendError, TryRecvError},
};

use crate::history::Sample;
use crate::tui::Model;

/// Upper bound on messages applied per tick so a fast source cannot stall
/// the refresh loop.
const MAX_MESSAGES_PER_TICK: usize = 100_000;

/// Messages sent from a sample source to the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A sample was observed
    Sample(Sample),
    /// The source skipped bad input
    SourceError(String),
    /// The source has no more samples
    SourceComplete,
}

#[ext(name = MessageSender)]
#[async_trait]
pub impl mpsc::Sender<Message> {
    async fn sample(&self, time: Instant, frequency: u64) -> Result<(), SendError<Message>> {
        self.send(Message::Sample(Sample::new(time, frequency)))
            .await
    }

    async fn source_error(
        &self,
        msg: impl Into<String> + Send,
    ) -> Result<(), SendError<Message>> {
        self.send(Message::SourceError(msg.into())).await
    }

    async fn source_complete(&self) -> Result<(), SendError<Message>> {
        self.send(Message::SourceComplete).await
    }
}

/// Drains the source channel into the model between ticks
pub struct EventListener {
    pub rx: mpsc::Receiver<Message>,
    pub completed: bool,
}

impl EventListener {
    pub fn new(rx: mpsc::Receiver<Message>) -> Self {
        Self {
            rx,
            completed: false,
        }
    }

    /// Apply every queued message without waiting. Returns the number of
    /// messages handled.
    pub fn process_available_messages(&mut self, model: &mut Model) -> usize {
        let mut handled = 0;

        while handled < MAX_MESSAGES_PER_TICK {
            match self.rx.try_recv() {
                Ok(message) => {
                    if message == Message::SourceComplete {
                        self.completed = true;
                    }
                    model.apply(message);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.completed = true;
                    break;
                }
            }
        }

        handled
    }
}
