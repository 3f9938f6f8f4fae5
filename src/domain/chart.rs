// Chart configuration domain model
use std::collections::VecDeque;

use super::window::SlidingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub title: String,
    pub position: AxisPosition,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AxisSpec {
    pub fn new(title: &str, position: AxisPosition, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            title: title.to_string(),
            position,
            min,
            max,
        }
    }

    /// Resolves the axis range, filling unset ends from the data with 10% headroom.
    pub fn bounds<'a>(&self, values: impl IntoIterator<Item = &'a f64>) -> [f64; 2] {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            return [min, max];
        }

        let (lo, hi) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        let min = self.min.unwrap_or(if lo.is_finite() { lo.min(0.0) } else { 0.0 });
        let max = self.max.unwrap_or(if hi.is_finite() { hi * 1.1 } else { 1.0 });
        if max > min { [min, max] } else { [min, min + 1.0] }
    }
}

/// Which window sequence feeds a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    Speed,
    Direction,
}

impl SeriesSource {
    pub fn values<'a>(&self, window: &'a SlidingWindow) -> &'a VecDeque<f64> {
        match self {
            SeriesSource::Speed => window.speeds(),
            SeriesSource::Direction => window.directions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub name: String,
    pub color: (u8, u8, u8),
    pub source: SeriesSource,
    pub axis: AxisPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub series: Vec<SeriesSpec>,
    pub axes: Vec<AxisSpec>,
}

impl ChartSpec {
    /// Speed on a left auto-scaled axis, direction on a right axis fixed to 0-360.
    pub fn wind() -> Self {
        Self {
            series: vec![
                SeriesSpec {
                    name: "Speed (km/h)".to_string(),
                    color: (75, 192, 192),
                    source: SeriesSource::Speed,
                    axis: AxisPosition::Left,
                },
                SeriesSpec {
                    name: "Direction (°)".to_string(),
                    color: (153, 102, 255),
                    source: SeriesSource::Direction,
                    axis: AxisPosition::Right,
                },
            ],
            axes: vec![
                AxisSpec::new("Speed (km/h)", AxisPosition::Left, None, None),
                AxisSpec::new("Direction (°)", AxisPosition::Right, Some(0.0), Some(360.0)),
            ],
        }
    }

    pub fn axis(&self, position: AxisPosition) -> Option<&AxisSpec> {
        self.axes.iter().find(|a| a.position == position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_chart_axes() {
        let spec = ChartSpec::wind();
        assert_eq!(spec.series.len(), 2);

        let right = spec.axis(AxisPosition::Right).unwrap();
        assert_eq!(right.bounds(&[720.0, -5.0]), [0.0, 360.0]);

        let left = spec.axis(AxisPosition::Left).unwrap();
        assert_eq!(left.bounds(&Vec::<f64>::new()), [0.0, 1.0]);
        let [min, max] = left.bounds(&[4.0, 10.0]);
        assert_eq!(min, 0.0);
        assert!((max - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_zero_data_keeps_a_range() {
        let axis = AxisSpec::new("Speed", AxisPosition::Left, None, None);
        assert_eq!(axis.bounds(&[0.0, 0.0]), [0.0, 1.0]);
    }
}
