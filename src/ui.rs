use std::io::{Write, stdout};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use crate::events::{EventListener, Message};
use crate::render::CurvePoint;
use crate::runner::SourceRunner;
use crate::tui::{self, Model};

pub struct MonitorUI {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    listener: EventListener,
    tick: Duration,
}

impl MonitorUI {
    pub fn new(rx: mpsc::Receiver<Message>, tick: Duration) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let listener = EventListener::new(rx);

        Ok(Self {
            terminal,
            listener,
            tick,
        })
    }

    pub async fn run(&mut self, runner: SourceRunner, model: &mut Model) -> Result<()> {
        let mut interval = time::interval(self.tick);
        info!(source = runner.name(), "monitor started");
        let running = runner.spawn();

        loop {
            // Check for key events
            if event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    // Handle quit keys: 'q', ESC, or Ctrl-C
                    let should_quit = key.code == KeyCode::Char('q')
                        || key.code == KeyCode::Esc
                        || (key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL));

                    if should_quit {
                        break;
                    }
                }
            }

            // Wait for tick
            interval.tick().await;

            let handled = self.listener.process_available_messages(model);
            model.tick();
            debug!(handled, retained = model.history.len(), "tick");

            self.terminal.draw(|f| {
                tui::draw(f, model);
            })?;

            // Keep showing the window after the source completes so it can
            // drain; only the user closes the monitor.
        }

        finish(running).await
    }
}

impl Drop for MonitorUI {
    fn drop(&mut self) {
        // Cleanup terminal
        let _ = disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Prints the exported curve as one JSON line per tick
pub struct HeadlessMonitor<W> {
    listener: EventListener,
    tick: Duration,
    max_ticks: Option<usize>,
    out: W,
}

impl<W: Write> HeadlessMonitor<W> {
    pub fn new(
        rx: mpsc::Receiver<Message>,
        tick: Duration,
        max_ticks: Option<usize>,
        out: W,
    ) -> Self {
        Self {
            listener: EventListener::new(rx),
            tick,
            max_ticks,
            out,
        }
    }

    /// Tick until the source completes or `max_ticks` lines were printed
    pub async fn run(&mut self, runner: SourceRunner, model: &mut Model) -> Result<()> {
        let mut interval = time::interval(self.tick);
        info!(source = runner.name(), "headless export started");
        let running = runner.spawn();
        let mut emitted = 0usize;

        loop {
            interval.tick().await;

            self.listener.process_available_messages(model);
            let points = model.tick();
            self.emit(model, &points)?;
            emitted += 1;

            if self.listener.completed {
                break;
            }
            if self.max_ticks.is_some_and(|max| emitted >= max) {
                break;
            }
        }

        info!(emitted, "headless export finished");
        finish(running).await
    }

    fn emit(&mut self, model: &Model, points: &[CurvePoint]) -> Result<()> {
        let stats = model.history.stats();
        let line = json!({
            "time_utc": Utc::now().to_rfc3339(),
            "span_s": stats.span.as_secs_f64(),
            "received": model.received,
            "retained": stats.retained,
            "rejected": stats.rejected,
            "max_frequency": stats.max_frequency,
            "source_errors": model.source_errors.len(),
            "points": points.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
        });

        writeln!(self.out, "{}", serde_json::to_string(&line)?)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Stop the source task and surface its error, if any
async fn finish(running: JoinHandle<Result<()>>) -> Result<()> {
    if !running.is_finished() {
        running.abort();
    }

    match running.await {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::config::GraphConfig;
    use crate::sources::lines::LineSource;

    #[tokio::test]
    async fn test_headless_until_source_completes() {
        let input: &'static [u8] = b"5\n3 3000\nbad\n";
        let (tx, rx) = mpsc::channel(16);
        let runner = SourceRunner::new(Box::new(LineSource::new("test", input)), tx);

        let config = GraphConfig::new(Duration::from_secs(5), Duration::from_secs(60), 8);
        let mut model = Model::new(config);
        let mut monitor = HeadlessMonitor::new(rx, Duration::from_millis(10), Some(200), Vec::new());

        monitor.run(runner, &mut model).await.unwrap();

        let out = String::from_utf8(monitor.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert!(!lines.is_empty());
        let last = lines.last().unwrap();
        assert_eq!(last["received"], 2);
        assert_eq!(last["source_errors"], 1);
        assert_eq!(last["points"].as_array().unwrap().len(), 10);
        assert_eq!(last["max_frequency"], 5);
    }

    #[tokio::test]
    async fn test_headless_stops_at_max_ticks() {
        let (tx, rx) = mpsc::channel(16);
        let source = crate::sources::synthetic::Synthetic::new(
            crate::sources::synthetic::SyntheticArgs {
                rate: 50,
                base: 10,
                amplitude: 5,
                period: 10.0,
                jitter_ms: 0,
                count: None,
            },
        );
        let runner = SourceRunner::new(Box::new(source), tx);
        let mut model = Model::new(GraphConfig::default());
        let mut monitor = HeadlessMonitor::new(rx, Duration::from_millis(10), Some(3), Vec::new());

        monitor.run(runner, &mut model).await.unwrap();

        let out = String::from_utf8(monitor.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 3);
    }
}
