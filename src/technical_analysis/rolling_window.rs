use std::collections::VecDeque;

/// Baseline of recent bucket activity.
///
/// Keeps the last `capacity` per-bucket total volumes and absolute imbalances
/// and exposes their arithmetic means over the samples currently held.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    volumes: VecDeque<f64>,
    abs_imbalances: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            volumes: VecDeque::with_capacity(capacity),
            abs_imbalances: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one bucket's sample, evicting the oldest beyond capacity
    pub fn push(&mut self, total_volume: f64, signed_imbalance: f64) {
        let abs_imbalance = signed_imbalance.abs();

        if self.volumes.len() >= self.capacity {
            self.volumes.pop_front();
            self.abs_imbalances.pop_front();
        }

        self.volumes.push_back(total_volume);
        self.abs_imbalances.push_back(abs_imbalance);
    }

    pub fn mean_volume(&self) -> f64 {
        if self.volumes.is_empty() {
            return 0.0;
        }
        self.volumes.iter().sum::<f64>() / self.volumes.len() as f64
    }

    pub fn mean_abs_imbalance(&self) -> f64 {
        if self.abs_imbalances.is_empty() {
            return 0.0;
        }
        self.abs_imbalances.iter().sum::<f64>() / self.abs_imbalances.len() as f64
    }

    /// Ready once at least half the window is filled
    pub fn is_ready(&self) -> bool {
        self.volumes.len() >= self.capacity / 2
    }

    pub fn reset(&mut self) {
        self.volumes.clear();
        self.abs_imbalances.clear();
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
