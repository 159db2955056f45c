use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Aggregate latency figures for one operation category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Measures elapsed time of named operations for display ("query took
/// 0.042s").
///
/// One in-flight timer per monitor: `start_timer` simply overwrites any
/// previous start, and `stop_timer` without a start returns `0.0` rather than
/// erroring. Sample categories are created on demand.
#[derive(Debug, Default)]
pub struct TimingMonitor {
    samples: HashMap<String, Vec<f64>>,
    started: Option<Instant>,
}

impl TimingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop the in-flight timer, record the elapsed seconds under `category`,
    /// and return them. Returns `0.0` (recording nothing) when no timer was
    /// started.
    pub fn stop_timer(&mut self, category: &str) -> f64 {
        let Some(started) = self.started.take() else {
            return 0.0;
        };
        let elapsed = started.elapsed().as_secs_f64();
        self.samples
            .entry(category.to_string())
            .or_default()
            .push(elapsed);
        elapsed
    }

    /// Mean of the category's samples; `0.0` for an unknown or empty
    /// category.
    pub fn get_average(&self, category: &str) -> f64 {
        match self.samples.get(category) {
            Some(times) if !times.is_empty() => {
                times.iter().sum::<f64>() / times.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Per-category aggregates, keyed by category name. Categories without
    /// samples are omitted.
    pub fn get_stats(&self) -> BTreeMap<String, TimingStats> {
        let mut stats = BTreeMap::new();
        for (category, times) in &self.samples {
            if times.is_empty() {
                continue;
            }
            let sum: f64 = times.iter().sum();
            let min = times.iter().copied().fold(f64::INFINITY, f64::min);
            let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            stats.insert(
                category.clone(),
                TimingStats {
                    avg: sum / times.len() as f64,
                    min,
                    max,
                    count: times.len(),
                },
            );
        }
        stats
    }

    /// Clear all sample lists.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
