//! Historical queue counts for sparklines and rate calculations.

use std::collections::VecDeque;
use std::time::Instant;

use mentionwatch_types::QueueStatus;

/// Maximum number of queue readings to keep.
const MAX_HISTORY_SIZE: usize = 60;

/// Which queue counter a sparkline or rate is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSeries {
    Pending,
    Completed,
    Failed,
}

/// Rolling record of queue updates.
///
/// Each `queue_update` appends one reading; the console uses the series to
/// draw trends and compute completion and failure rates.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub pending: VecDeque<u64>,
    pub completed: VecDeque<u64>,
    pub failed: VecDeque<u64>,
    /// Timestamps of readings for rate calculations.
    pub timestamps: VecDeque<Instant>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a queue status reading taken at `at`.
    pub fn record(&mut self, status: &QueueStatus, at: Instant) {
        push_capped(&mut self.pending, status.pending);
        push_capped(&mut self.completed, status.completed);
        push_capped(&mut self.failed, status.failed);
        push_capped(&mut self.timestamps, at);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn series(&self, series: QueueSeries) -> &VecDeque<u64> {
        match series {
            QueueSeries::Pending => &self.pending,
            QueueSeries::Completed => &self.completed,
            QueueSeries::Failed => &self.failed,
        }
    }

    /// Sparkline of raw levels, normalized to 0-7 for 8 bar heights.
    ///
    /// Pending is a level, not a counter, so it is drawn as-is.
    pub fn level_sparkline(&self, series: QueueSeries) -> Vec<u8> {
        let values = self.series(series);
        if values.is_empty() {
            return Vec::new();
        }
        let max = values.iter().copied().max().unwrap_or(0).max(1) as f64;
        values
            .iter()
            .map(|&v| ((v as f64 / max * 7.0) as u8).min(7))
            .collect()
    }

    /// Sparkline of deltas between consecutive readings, normalized to 0-7.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn delta_sparkline(&self, series: QueueSeries) -> Vec<u8> {
        let values = self.series(series);
        if values.len() < 2 {
            return Vec::new();
        }

        let deltas: Vec<i64> = values
            .iter()
            .zip(values.iter().skip(1))
            .map(|(a, b)| *b as i64 - *a as i64)
            .collect();

        let max = deltas.iter().copied().max().unwrap_or(1).max(1);
        let min = deltas.iter().copied().min().unwrap_or(0).min(0);
        let range = (max - min).max(1) as f64;

        deltas
            .iter()
            .map(|&v| (((v - min) as f64 / range * 7.0) as u8).min(7))
            .collect()
    }

    /// Change per second between the last two readings.
    ///
    /// Returns None if there's not enough history to calculate a rate.
    pub fn rate(&self, series: QueueSeries) -> Option<f64> {
        let values = self.series(series);
        if values.len() < 2 || self.timestamps.len() < 2 {
            return None;
        }

        let current = *values.back()?;
        let previous = *values.get(values.len() - 2)?;
        let delta = current as i64 - previous as i64;

        let current_time = self.timestamps.back()?;
        let previous_time = self.timestamps.get(self.timestamps.len() - 2)?;
        let elapsed = current_time.duration_since(*previous_time).as_secs_f64();

        if elapsed > 0.0 {
            Some(delta as f64 / elapsed)
        } else {
            None
        }
    }
}

fn push_capped<T>(series: &mut VecDeque<T>, value: T) {
    series.push_back(value);
    if series.len() > MAX_HISTORY_SIZE {
        series.pop_front();
    }
}
