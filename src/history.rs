//! Bounded rolling buffer of anomaly scores.

use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct RollingHistory {
    samples: VecDeque<f64>,
    capacity: usize,
    /// Samples ever appended, including evicted ones.
    total: u64,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Append samples in order, evicting from the front past capacity.
    pub fn append(&mut self, new_samples: &[f64]) {
        for &s in new_samples {
            self.samples.push_back(s);
            self.total += 1;
        }
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn total_appended(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// 1-based ordinal of each retained sample, oldest first.
    pub fn ordinals(&self) -> impl Iterator<Item = u64> {
        let first = self.total - self.samples.len() as u64 + 1;
        first..=self.total
    }

    /// Axis labels parallel to `to_vec()`.
    pub fn labels(&self) -> Vec<String> {
        self.ordinals().map(|n| n.to_string()).collect()
    }
}
