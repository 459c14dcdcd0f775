use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::info;

use crate::aggregation::structs::{AggregateBucket, TimestampMS};
use super::structs::{Pivot, PivotPool, PivotSide, SweepResult};

/// Confirms swing highs/lows on the coarse bucket series and keeps a bounded
/// pool of them per side for sweep queries.
#[derive(Debug, Clone)]
pub struct PivotTracker {
    /// Buckets required on each side of a candidate
    lookback: usize,
    highs: PivotPool,
    lows: PivotPool,
    /// Bucket timestamps already confirmed, per side
    confirmed_highs: FxHashSet<TimestampMS>,
    confirmed_lows: FxHashSet<TimestampMS>,
}

impl PivotTracker {
    pub fn new(lookback: usize, pool_max_size: usize) -> Self {
        Self {
            lookback,
            highs: PivotPool::new(PivotSide::High, pool_max_size),
            lows: PivotPool::new(PivotSide::Low, pool_max_size),
            confirmed_highs: FxHashSet::default(),
            confirmed_lows: FxHashSet::default(),
        }
    }

    /// Re-evaluate after a coarse bucket was appended to `history`.
    ///
    /// Only the bucket with exactly `lookback` neighbours on each side is
    /// examined. Returns the pivots confirmed by this call.
    pub fn on_coarse_bucket_close(&mut self, history: &VecDeque<AggregateBucket>) -> Vec<(PivotSide, Pivot)> {
        let mut confirmed = Vec::new();
        let window = 2 * self.lookback + 1;
        if history.len() < window {
            return confirmed;
        }

        let idx = history.len() - 1 - self.lookback;
        let candidate = &history[idx];
        let neighbours = (idx - self.lookback..idx).chain(idx + 1..=idx + self.lookback);

        if !self.confirmed_highs.contains(&candidate.open_time) {
            let is_high = neighbours.clone().all(|i| candidate.high > history[i].high);
            if is_high {
                let pivot = Pivot {
                    price: candidate.high,
                    timestamp: candidate.open_time,
                    index: idx,
                };
                self.confirmed_highs.insert(candidate.open_time);
                self.highs.insert(pivot);
                info!(price = pivot.price, timestamp = pivot.timestamp, pool = self.highs.len(), "📈 High pivot confirmed");
                confirmed.push((PivotSide::High, pivot));
            }
        }

        if !self.confirmed_lows.contains(&candidate.open_time) {
            let is_low = neighbours.clone().all(|i| candidate.low < history[i].low);
            if is_low {
                let pivot = Pivot {
                    price: candidate.low,
                    timestamp: candidate.open_time,
                    index: idx,
                };
                self.confirmed_lows.insert(candidate.open_time);
                self.lows.insert(pivot);
                info!(price = pivot.price, timestamp = pivot.timestamp, pool = self.lows.len(), "📉 Low pivot confirmed");
                confirmed.push((PivotSide::Low, pivot));
            }
        }

        // Timestamps older than the retained history can never be evaluated again
        if let Some(oldest) = history.front().map(|b| b.open_time) {
            self.confirmed_highs.retain(|&ts| ts >= oldest);
            self.confirmed_lows.retain(|&ts| ts >= oldest);
        }

        confirmed
    }

    /// High-pool pivots strictly below `candle_high`
    pub fn swept_highs(&self, candle_high: f64) -> SweepResult {
        SweepResult::from_pivots(self.highs.iter().filter(|p| p.price < candle_high).copied().collect())
    }

    /// Low-pool pivots strictly above `candle_low`
    pub fn swept_lows(&self, candle_low: f64) -> SweepResult {
        SweepResult::from_pivots(self.lows.iter().filter(|p| p.price > candle_low).copied().collect())
    }

    /// Drop consumed pivots from the named pool
    pub fn remove_swept(&mut self, side: PivotSide, pivots: &[Pivot]) -> usize {
        match side {
            PivotSide::High => self.highs.remove(pivots),
            PivotSide::Low => self.lows.remove(pivots),
        }
    }

    pub fn pool(&self, side: PivotSide) -> &PivotPool {
        match side {
            PivotSide::High => &self.highs,
            PivotSide::Low => &self.lows,
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}
