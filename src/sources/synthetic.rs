use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_rate_limiter::RateLimiter;
use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;

use super::SampleSource;
use crate::events::{Message, MessageSender};

#[derive(Parser, Debug, Clone)]
pub struct SyntheticArgs {
    /// Samples generated per second
    #[arg(short, long, default_value_t = 20)]
    pub rate: usize,

    /// Mean frequency of generated samples
    #[arg(long, default_value_t = 50)]
    pub base: u64,

    /// Peak deviation from the mean frequency
    #[arg(long, default_value_t = 40)]
    pub amplitude: u64,

    /// Period of the frequency wave, in seconds
    #[arg(long, default_value_t = 60.0)]
    pub period: f64,

    /// Maximum back-dating of a sample in milliseconds. Non-zero values make
    /// samples arrive out of order.
    #[arg(long, default_value_t = 250)]
    pub jitter_ms: u64,

    /// Stop after this many samples
    #[arg(short, long)]
    pub count: Option<usize>,
}

/// Random samples following a slow sine wave
pub struct Synthetic {
    args: SyntheticArgs,
}

impl Synthetic {
    pub fn new(args: SyntheticArgs) -> Self {
        Self { args }
    }

    fn frequency_at(&self, elapsed: Duration) -> u64 {
        let amplitude = self.args.amplitude as f64;
        let phase = if self.args.period > 0.0 {
            elapsed.as_secs_f64() / self.args.period * TAU
        } else {
            0.0
        };
        let noise = if amplitude > 0.0 {
            rand::random_range(-0.25..=0.25_f64) * amplitude
        } else {
            0.0
        };

        (self.args.base as f64 + phase.sin() * amplitude + noise)
            .round()
            .max(1.0) as u64
    }

    fn backdate(&self, now: Instant) -> Instant {
        if self.args.jitter_ms == 0 {
            return now;
        }
        let back = Duration::from_millis(rand::random_range(0..=self.args.jitter_ms));
        now.checked_sub(back).unwrap_or(now)
    }
}

#[async_trait]
impl SampleSource for Synthetic {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<Message>) -> Result<()> {
        let rate_limiter = RateLimiter::new(self.args.rate.max(1));
        rate_limiter.burst(self.args.rate.max(1));

        let started = Instant::now();
        let mut generated = 0usize;

        while self.args.count.is_none_or(|count| generated < count) {
            rate_limiter.acquire().await;

            let now = Instant::now();
            let frequency = self.frequency_at(now - started);
            if tx.sample(self.backdate(now), frequency).await.is_err() {
                break;
            }
            generated += 1;
        }

        tracing::info!(generated, "synthetic source finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SyntheticArgs {
        SyntheticArgs {
            rate: 1000,
            base: 50,
            amplitude: 40,
            period: 60.0,
            jitter_ms: 250,
            count: Some(5),
        }
    }

    #[test]
    fn test_frequency_stays_positive() {
        let synthetic = Synthetic::new(SyntheticArgs {
            base: 0,
            ..args()
        });

        for secs in 0..120 {
            assert!(synthetic.frequency_at(Duration::from_secs(secs)) >= 1);
        }
    }

    #[test]
    fn test_frequency_follows_wave() {
        let synthetic = Synthetic::new(SyntheticArgs {
            amplitude: 0,
            ..args()
        });

        assert_eq!(synthetic.frequency_at(Duration::from_secs(15)), 50);
    }

    #[test]
    fn test_backdate_within_jitter() {
        let synthetic = Synthetic::new(args());
        let now = Instant::now();

        for _ in 0..100 {
            let time = synthetic.backdate(now);
            assert!(time <= now);
            assert!(now - time <= Duration::from_millis(250));
        }
    }

    #[tokio::test]
    async fn test_run_stops_after_count() {
        let source = Box::new(Synthetic::new(args()));
        let (tx, mut rx) = mpsc::channel(16);

        source.run(tx).await.unwrap();

        let mut samples = 0;
        while let Some(message) = rx.recv().await {
            assert!(matches!(message, Message::Sample(s) if s.time <= Instant::now()));
            samples += 1;
        }
        assert_eq!(samples, 5);
    }
}
