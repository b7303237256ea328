//! TUI components for the streaming graph monitor
//!
//! The model owns the frequency history and the latest curve; each section of
//! the screen is a separate widget reading from it.

use std::collections::VecDeque;

use ratatui::prelude::*;
use tracing::{debug, warn};

pub mod graph;
pub mod stats;

use graph::GraphWidget;
use stats::StatsWidget;

use crate::config::GraphConfig;
use crate::events::Message;
use crate::history::FrequencyHistory;
use crate::render::{self, CurvePoint, Surface};

/// Interpolated points inserted between exported curve points
const SMOOTH_STEPS: usize = 4;

/// Source errors kept for display
const MAX_SOURCE_ERRORS: usize = 5;

/// The main model containing all UI state
#[derive(Clone, Debug)]
pub struct Model {
    pub history: FrequencyHistory,
    pub curve: Vec<CurvePoint>,
    pub received: usize,
    pub source_errors: VecDeque<String>,
    pub source_complete: bool,
}

impl Model {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            history: FrequencyHistory::new(config),
            curve: Vec::new(),
            received: 0,
            source_errors: VecDeque::with_capacity(MAX_SOURCE_ERRORS),
            source_complete: false,
        }
    }

    pub fn apply(&mut self, message: Message) {
        match message {
            Message::Sample(sample) => {
                self.received += 1;
                if let Err(err) = self.history.add(sample.time, sample.frequency) {
                    debug!(%err, "sample dropped");
                }
            }
            Message::SourceError(msg) => {
                warn!(%msg, "source error");
                if self.source_errors.len() == MAX_SOURCE_ERRORS {
                    self.source_errors.pop_front();
                }
                self.source_errors.push_back(msg);
            }
            Message::SourceComplete => {
                self.source_complete = true;
            }
        }
    }

    /// Refresh the history and redraw the curve. Returns the unsmoothed
    /// export.
    pub fn tick(&mut self) -> Vec<CurvePoint> {
        let points = self.history.tick();
        self.draw_curve(&points);
        points
    }
}

impl Surface for Model {
    fn draw_curve(&mut self, points: &[CurvePoint]) {
        self.curve = render::smooth(points, SMOOTH_STEPS);
    }
}

/// The main UI function that renders all components
pub fn draw(f: &mut Frame, model: &Model) {
    let area = f.area();
    if area.height < 10 || area.width < 70 {
        let error_msg = format!(
            "Terminal too small! Need at least 70x10, have {}x{}",
            area.width, area.height
        );
        let error_para = ratatui::widgets::Paragraph::new(error_msg)
            .block(
                ratatui::widgets::Block::default()
                    .title("Error")
                    .borders(ratatui::widgets::Borders::ALL),
            )
            .style(Style::default().fg(Color::Red));
        error_para.render(area, f.buffer_mut());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([
            Constraint::Length(30), // Stats
            Constraint::Min(40),    // Curve
        ])
        .split(area);

    f.render_widget(StatsWidget::new(model), chunks[0]);
    f.render_widget(GraphWidget::new(model), chunks[1]);
}
