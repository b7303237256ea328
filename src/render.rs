//! Curve export for drawing surfaces
//!
//! The history is reduced to one point per segment, placed at the segment
//! centre, plus two anchors at the left and right edges. Coordinates are
//! normalized to `[0, 1]` on both axes.

use crate::history::FrequencyHistory;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

impl CurvePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Anything that can draw a normalized curve
pub trait Surface {
    fn draw_curve(&mut self, points: &[CurvePoint]);
}

/// Export the segments of `history` as `segment_count + 2` normalized
/// points. Returns nothing when there are no segments.
pub fn export(history: &FrequencyHistory) -> Vec<CurvePoint> {
    let segment_count = history.config().segment_count;
    if segment_count == 0 {
        return Vec::new();
    }

    let max_frequency = history.max_frequency();
    let normalize = |frequency: u64| {
        if max_frequency == 0 {
            0.0
        } else {
            frequency as f64 / max_frequency as f64
        }
    };

    let n = segment_count as f64;
    let centre_offset = 0.5 / n;
    let frequencies: Vec<u64> = (0..segment_count)
        .map(|i| history.segment_frequency(i))
        .collect();

    let mut points = Vec::with_capacity(segment_count + 2);
    points.push(CurvePoint::new(0.0, normalize(frequencies[0])));
    for (i, &frequency) in frequencies.iter().enumerate() {
        points.push(CurvePoint::new(i as f64 / n + centre_offset, normalize(frequency)));
    }
    points.push(CurvePoint::new(1.0, normalize(frequencies[segment_count - 1])));

    points
}

/// Densify a curve with Catmull-Rom interpolation.
///
/// `steps` extra points are inserted between each pair of input points. The
/// output keeps every input point and stays within `[0, 1]` vertically.
pub fn smooth(points: &[CurvePoint], steps: usize) -> Vec<CurvePoint> {
    if points.len() < 3 || steps == 0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len() + (points.len() - 1) * steps);
    for i in 0..points.len() - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(points.len() - 1)];

        out.push(p1);
        for step in 1..=steps {
            let t = step as f64 / (steps + 1) as f64;
            let x = p1.x + (p2.x - p1.x) * t;
            let y = catmull_rom(p0.y, p1.y, p2.y, p3.y, t).clamp(0.0, 1.0);
            out.push(CurvePoint::new(x, y));
        }
    }
    out.push(points[points.len() - 1]);

    out
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::config::GraphConfig;

    fn history(segments: usize) -> FrequencyHistory {
        FrequencyHistory::new(GraphConfig::new(
            Duration::from_secs(4),
            Duration::from_secs(4),
            segments,
        ))
    }

    #[test]
    fn test_export_layout() {
        let now = Instant::now();
        let mut history = history(4);
        history.add_at(now - Duration::from_millis(3500), 2, now).unwrap();
        history.add_at(now - Duration::from_millis(1500), 4, now).unwrap();
        history.add_at(now - Duration::from_millis(500), 1, now).unwrap();

        let points = history.tick_at(now);

        assert_eq!(points.len(), 6);
        assert_eq!(points[0], CurvePoint::new(0.0, 0.5));
        assert_eq!(points[1], CurvePoint::new(0.125, 0.5));
        assert_eq!(points[2], CurvePoint::new(0.375, 0.0));
        assert_eq!(points[3], CurvePoint::new(0.625, 1.0));
        assert_eq!(points[4], CurvePoint::new(0.875, 0.25));
        assert_eq!(points[5], CurvePoint::new(1.0, 0.25));
    }

    #[test]
    fn test_export_without_samples_is_flat() {
        let mut history = history(3);

        let points = history.tick_at(Instant::now());

        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|p| p.y == 0.0 && p.y.is_finite()));
    }

    #[test]
    fn test_export_without_segments() {
        let history = history(0);
        assert!(export(&history).is_empty());
    }

    #[test]
    fn test_smooth_keeps_endpoints_and_bounds() {
        let points = vec![
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(0.25, 1.0),
            CurvePoint::new(0.75, 0.0),
            CurvePoint::new(1.0, 1.0),
        ];

        let smoothed = smooth(&points, 3);

        assert_eq!(smoothed.len(), 4 + 3 * 3);
        assert_eq!(smoothed.first(), points.first());
        assert_eq!(smoothed.last(), points.last());
        assert_eq!(smoothed[4], points[1]);
        assert!(smoothed.iter().all(|p| (0.0..=1.0).contains(&p.y)));
        assert!(smoothed.windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn test_smooth_short_curve_is_unchanged() {
        let points = vec![CurvePoint::new(0.0, 0.2), CurvePoint::new(1.0, 0.4)];
        assert_eq!(smooth(&points, 4), points);
    }
}
