//! Stats and source status component for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem},
};

use crate::tui::{Model, graph::format_span};

/// Widget listing history statistics and recent source errors
pub struct StatsWidget<'a> {
    model: &'a Model,
}

impl<'a> StatsWidget<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    fn items(&self) -> Vec<ListItem<'a>> {
        let stats = self.model.history.stats();
        let config = self.model.history.config();

        let mut items = vec![
            ListItem::new(format!("Received: {}", self.model.received)),
            ListItem::new(format!("Rejected: {}", stats.rejected)),
            ListItem::new(format!("Retained: {}", stats.retained)),
            ListItem::new(format!("Total frequency: {}", stats.total_frequency)),
            ListItem::new(format!("Peak frequency: {}", stats.max_frequency)),
            ListItem::new(format!(
                "Window: {} ({}..{})",
                format_span(stats.span),
                format_span(config.min_span),
                format_span(config.max_span)
            )),
            ListItem::new(format!("Segments: {}", config.segment_count)),
        ];

        let status = if self.model.source_complete {
            Span::styled("Source: complete", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("Source: running", Style::default().fg(Color::Green))
        };
        items.push(ListItem::new(status));

        if !self.model.source_errors.is_empty() {
            items.push(ListItem::new(""));
            items.push(ListItem::new("Recent errors:"));
            for error in self.model.source_errors.iter().rev() {
                let msg = if error.chars().count() > 26 {
                    format!("{}...", error.chars().take(23).collect::<String>())
                } else {
                    error.clone()
                };
                items.push(ListItem::new(Span::styled(msg, Style::default().fg(Color::Red))));
            }
        }

        items.push(ListItem::new(""));
        items.push(ListItem::new("Press 'q' or ESC to quit"));
        items
    }
}

impl<'a> Widget for StatsWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let list = List::new(self.items())
            .block(Block::default().title("Stats").borders(Borders::ALL));

        Widget::render(list, area, buf);
    }
}
