// History log of recent updates, newest first
use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

use super::sample::Sample;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLine {
    pub display_time: String,
    pub speed: f64,
    pub direction: i64,
}

impl HistoryLine {
    pub fn new(sample: &Sample, now: DateTime<Local>) -> Self {
        Self {
            display_time: now.format("%H:%M:%S").to_string(),
            speed: sample.speed,
            direction: sample.direction.round() as i64,
        }
    }
}

impl fmt::Display for HistoryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Speed: {:.1} km/h, Dir: {}°",
            self.display_time, self.speed, self.direction
        )
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    capacity: usize,
    lines: VecDeque<HistoryLine>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn record(&mut self, sample: &Sample, now: DateTime<Local>) {
        self.lines.push_front(HistoryLine::new(sample, now));
        while self.lines.len() > self.capacity {
            self.lines.pop_back();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines ordered newest first.
    pub fn lines(&self) -> impl Iterator<Item = &HistoryLine> {
        self.lines.iter()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_line_format() {
        let line = HistoryLine::new(&Sample::new(12.34, 46.6), base_time());
        assert_eq!(line.to_string(), "14:30:00 - Speed: 12.3 km/h, Dir: 47°");
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut log = HistoryLog::default();
        for n in 0..25 {
            log.record(
                &Sample::new(n as f64, 0.0),
                base_time() + Duration::seconds(n),
            );
            assert!(log.len() <= DEFAULT_HISTORY_CAPACITY);
        }

        let speeds: Vec<f64> = log.lines().map(|l| l.speed).collect();
        let expected: Vec<f64> = (15..25).rev().map(|n| n as f64).collect();
        assert_eq!(speeds, expected);
    }

    #[test]
    fn test_independent_capacity() {
        let mut log = HistoryLog::new(2);
        for n in 0..3 {
            log.record(&Sample::new(n as f64, 90.0), base_time());
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.lines().next().map(|l| l.speed), Some(2.0));
    }
}
