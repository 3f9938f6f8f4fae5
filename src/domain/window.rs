// Sliding window of recent samples backing the chart
use std::collections::VecDeque;

use super::sample::ReceivedSample;

pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    pub time_label: String,
    pub speed: f64,
    pub direction: f64,
}

impl WindowEntry {
    pub fn new(time_label: String, speed: f64, direction: f64) -> Self {
        Self {
            time_label,
            speed,
            direction,
        }
    }

    pub fn from_received(received: &ReceivedSample) -> Self {
        Self::new(
            received.received_at.format("%H:%M:%S").to_string(),
            received.sample.speed,
            received.sample.direction,
        )
    }
}

/// Three index-aligned sequences sharing one capacity.
///
/// `labels[i]`, `speeds[i]` and `directions[i]` always describe the same
/// observation; every mutation touches all three.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    labels: VecDeque<String>,
    speeds: VecDeque<f64>,
    directions: VecDeque<f64>,
}

impl SlidingWindow {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            labels: VecDeque::with_capacity(capacity + 1),
            speeds: VecDeque::with_capacity(capacity + 1),
            directions: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn append(&mut self, entry: WindowEntry) {
        self.labels.push_back(entry.time_label);
        self.speeds.push_back(entry.speed);
        self.directions.push_back(entry.direction);

        while self.labels.len() > self.capacity {
            self.labels.pop_front();
            self.speeds.pop_front();
            self.directions.pop_front();
        }

        debug_assert!(self.labels.len() == self.speeds.len());
        debug_assert!(self.labels.len() == self.directions.len());
    }

    pub fn labels(&self) -> &VecDeque<String> {
        &self.labels
    }

    pub fn speeds(&self) -> &VecDeque<f64> {
        &self.speeds
    }

    pub fn directions(&self) -> &VecDeque<f64> {
        &self.directions
    }

    pub fn entries(&self) -> impl Iterator<Item = WindowEntry> + '_ {
        self.labels
            .iter()
            .zip(&self.speeds)
            .zip(&self.directions)
            .map(|((label, speed), direction)| WindowEntry::new(label.clone(), *speed, *direction))
    }

    pub fn latest(&self) -> Option<WindowEntry> {
        self.entries().last()
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
