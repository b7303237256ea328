//! Frequency curve component for the TUI

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::tui::Model;

/// Widget drawing the smoothed curve over the visible window
pub struct GraphWidget<'a> {
    model: &'a Model,
}

impl<'a> GraphWidget<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    fn title(&self) -> String {
        format!(
            "Frequency ({})",
            format_span(self.model.history.time_span())
        )
    }
}

impl<'a> Widget for GraphWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.model.curve.is_empty() {
            // Nothing exported yet
            Block::default()
                .title(self.title())
                .borders(Borders::ALL)
                .render(area, buf);
            return;
        }

        let span = self.model.history.time_span();
        let span_secs = span.as_secs_f64().max(f64::EPSILON);
        let max_frequency = self.model.history.max_frequency() as f64;
        let y_max = (max_frequency * 1.1).max(1.0);

        // Seconds before now on the x axis, frequency on the y axis
        let data: Vec<(f64, f64)> = self
            .model
            .curve
            .iter()
            .map(|p| ((p.x - 1.0) * span_secs, p.y * max_frequency))
            .collect();

        let datasets = vec![
            Dataset::default()
                .name("frequency")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Green))
                .data(&data),
        ];

        let label_count = self.model.history.config().label_count;
        let x_labels: Vec<Span> = axis_labels(span, label_count, Local::now())
            .into_iter()
            .map(Span::raw)
            .collect();

        let y_labels = vec![
            Span::raw("0"),
            Span::raw(format!("{:.0}", y_max / 2.0)),
            Span::raw(format!("{:.0}", y_max)),
        ];

        let chart = Chart::new(datasets)
            .block(Block::default().title(self.title()).borders(Borders::ALL))
            .x_axis(
                Axis::default()
                    .title("Time")
                    .style(Style::default().fg(Color::Gray))
                    .labels(x_labels)
                    .bounds([-span_secs, 0.0]),
            )
            .y_axis(
                Axis::default()
                    .title("Frequency")
                    .style(Style::default().fg(Color::Gray))
                    .labels(y_labels)
                    .bounds([0.0, y_max]),
            )
            .hidden_legend_constraints((Constraint::Percentage(50), Constraint::Percentage(50)));

        chart.render(area, buf);
    }
}

/// Evenly spaced wall-clock labels across a window ending at `now`, oldest
/// first.
pub fn axis_labels(span: Duration, count: usize, now: DateTime<Local>) -> Vec<String> {
    match count {
        0 => Vec::new(),
        1 => vec![now.format("%H:%M:%S").to_string()],
        _ => (0..count)
            .map(|i| {
                let back = span.mul_f64(1.0 - i as f64 / (count - 1) as f64);
                let back = TimeDelta::from_std(back).unwrap_or(TimeDelta::zero());
                (now - back).format("%H:%M:%S").to_string()
            })
            .collect(),
    }
}

/// Compact span such as `45s`, `5m` or `1m30s`
pub fn format_span(span: Duration) -> String {
    let secs = span.as_secs();
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s}s"),
    }
}
