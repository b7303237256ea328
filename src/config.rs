//! Window configuration for the streaming graph

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min span {min:?} exceeds max span {max:?}")]
    SpanBounds { min: Duration, max: Duration },
    #[error("max span must be non-zero")]
    ZeroMaxSpan,
}

/// Bounds and resolution of the visible window.
///
/// `label_count` is only read by renderers for axis labelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    pub min_span: Duration,
    pub max_span: Duration,
    pub segment_count: usize,
    pub label_count: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_span: Duration::from_secs(30),
            max_span: Duration::from_secs(300),
            segment_count: 60,
            label_count: 6,
        }
    }
}

impl GraphConfig {
    pub fn new(min_span: Duration, max_span: Duration, segment_count: usize) -> Self {
        Self {
            min_span,
            max_span,
            segment_count,
            ..Self::default()
        }
    }

    pub fn with_label_count(mut self, label_count: usize) -> Self {
        self.label_count = label_count;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_span.is_zero() {
            return Err(ConfigError::ZeroMaxSpan);
        }
        if self.min_span > self.max_span {
            return Err(ConfigError::SpanBounds {
                min: self.min_span,
                max: self.max_span,
            });
        }
        Ok(())
    }

    /// Width of one segment once the window has grown to `max_span`.
    pub fn max_segment_span(&self) -> Duration {
        match u32::try_from(self.segment_count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.max_span / n,
            Err(_) => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(GraphConfig::default().validate().is_ok());

        let inverted = GraphConfig::new(Duration::from_secs(10), Duration::from_secs(5), 10);
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::SpanBounds {
                min: Duration::from_secs(10),
                max: Duration::from_secs(5),
            })
        );

        let zero = GraphConfig::new(Duration::ZERO, Duration::ZERO, 10);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroMaxSpan));
    }

    #[test]
    fn test_max_segment_span() {
        let config = GraphConfig::new(Duration::from_secs(1), Duration::from_secs(60), 12);
        assert_eq!(config.max_segment_span(), Duration::from_secs(5));

        let empty = GraphConfig::new(Duration::from_secs(1), Duration::from_secs(60), 0);
        assert_eq!(empty.max_segment_span(), Duration::ZERO);
    }
}
