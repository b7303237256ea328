//! Line protocol source
//!
//! One sample per line: `<frequency>` or `<frequency> <age_ms>`, where the
//! optional age back-dates the sample relative to when the line was read.
//! Blank lines and lines starting with `#` are ignored.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

use super::SampleSource;
use crate::events::{Message, MessageSender};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid frequency {0:?}")]
    Frequency(String),
    #[error("invalid age {0:?}")]
    Age(String),
    #[error("unexpected field {0:?}")]
    Trailing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub frequency: u64,
    pub age: Duration,
}

pub fn parse_line(line: &str) -> Result<Option<Observation>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let Some(frequency) = fields.next() else {
        return Ok(None);
    };
    let frequency = frequency
        .parse::<u64>()
        .map_err(|_| ParseError::Frequency(frequency.to_string()))?;

    let age = match fields.next() {
        Some(age) => Duration::from_millis(
            age.parse::<u64>()
                .map_err(|_| ParseError::Age(age.to_string()))?,
        ),
        None => Duration::ZERO,
    };

    if let Some(extra) = fields.next() {
        return Err(ParseError::Trailing(extra.to_string()));
    }

    Ok(Some(Observation { frequency, age }))
}

pub struct LineSource<R> {
    name: String,
    reader: R,
}

impl<R> LineSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

#[async_trait]
impl<R> SampleSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<Message>) -> Result<()> {
        let LineSource { name, reader } = *self;
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;

            let sent = match parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(obs)) => {
                    let now = Instant::now();
                    let time = now.checked_sub(obs.age).unwrap_or(now);
                    tx.sample(time, obs.frequency).await
                }
                Err(err) => {
                    warn!(source = %name, line = line_no, %err, "skipping malformed line");
                    tx.source_error(format!("line {line_no}: {err}")).await
                }
            };

            // The monitor has gone away.
            if sent.is_err() {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# comment"), Ok(None));
        assert_eq!(
            parse_line("12"),
            Ok(Some(Observation {
                frequency: 12,
                age: Duration::ZERO
            }))
        );
        assert_eq!(
            parse_line(" 7  250 "),
            Ok(Some(Observation {
                frequency: 7,
                age: Duration::from_millis(250)
            }))
        );
        assert_eq!(
            parse_line("x"),
            Err(ParseError::Frequency("x".to_string()))
        );
        assert_eq!(
            parse_line("-3"),
            Err(ParseError::Frequency("-3".to_string()))
        );
        assert_eq!(
            parse_line("3 soon"),
            Err(ParseError::Age("soon".to_string()))
        );
        assert_eq!(
            parse_line("3 10 20"),
            Err(ParseError::Trailing("20".to_string()))
        );
    }

    #[tokio::test]
    async fn test_line_source_run() {
        let input: &'static [u8] = b"5\n# skipped\n\nbad\n3 100\n";
        let source = Box::new(LineSource::new("test", input));
        let (tx, mut rx) = mpsc::channel(16);

        source.run(tx).await.unwrap();

        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], Message::Sample(s) if s.frequency == 5));
        assert_eq!(
            messages[1],
            Message::SourceError("line 4: invalid frequency \"bad\"".to_string())
        );
        match messages[2] {
            Message::Sample(s) => {
                assert_eq!(s.frequency, 3);
                assert!(s.time <= Instant::now() - Duration::from_millis(100));
            }
            ref other => panic!("unexpected message {other:?}"),
        }
    }
}
