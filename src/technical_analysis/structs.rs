use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::aggregation::structs::TimestampMS;

/// Which extreme of the coarse bucket a pivot marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PivotSide {
    High,
    Low,
}

impl std::fmt::Display for PivotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PivotSide::High => write!(f, "High"),
            PivotSide::Low => write!(f, "Low"),
        }
    }
}

/// Confirmed local extremum of the coarse bucket series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub price: f64,
    /// Open time of the originating coarse bucket
    pub timestamp: TimestampMS,
    /// Position in the coarse history when the pivot was confirmed
    pub index: usize,
}

/// Size-bounded pool of confirmed pivots, oldest first
#[derive(Debug, Clone)]
pub struct PivotPool {
    side: PivotSide,
    pivots: VecDeque<Pivot>,
    max_size: usize,
}

impl PivotPool {
    pub fn new(side: PivotSide, max_size: usize) -> Self {
        Self {
            side,
            pivots: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Append a pivot, evicting the oldest beyond the bound
    pub fn insert(&mut self, pivot: Pivot) {
        self.pivots.push_back(pivot);
        while self.pivots.len() > self.max_size {
            if let Some(evicted) = self.pivots.pop_front() {
                debug!(side = %self.side, price = evicted.price, timestamp = evicted.timestamp, "Pivot evicted from pool");
            }
        }
    }

    /// Remove the given pivots (matched by timestamp), returning how many were removed
    pub fn remove(&mut self, pivots: &[Pivot]) -> usize {
        let before = self.pivots.len();
        self.pivots
            .retain(|p| !pivots.iter().any(|r| r.timestamp == p.timestamp));
        before - self.pivots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pivot> {
        self.pivots.iter()
    }

    pub fn side(&self) -> PivotSide {
        self.side
    }

    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Pool members crossed by a bucket extreme
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub pivots: Vec<Pivot>,
    pub count: usize,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SweepResult {
    pub fn from_pivots(pivots: Vec<Pivot>) -> Self {
        let min_price = pivots.iter().map(|p| p.price).reduce(f64::min);
        let max_price = pivots.iter().map(|p| p.price).reduce(f64::max);
        Self {
            count: pivots.len(),
            pivots,
            min_price,
            max_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Swept prices in ascending order
    pub fn sorted_prices(&self) -> Vec<f64> {
        let mut prices: Vec<f64> = self.pivots.iter().map(|p| p.price).collect();
        prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        prices
    }
}
