use tracing::{debug, info};

use crate::aggregation::structs::Bucket;
use crate::technical_analysis::pivots::PivotTracker;
use crate::technical_analysis::rolling_window::RollingWindow;
use crate::technical_analysis::structs::SweepResult;
use crate::volume_profile::structs::ProfileSnapshot;
use super::structs::{
    AbsorptionSignal, CancelReason, ConfirmationOutcome, PendingCandidate, SignalConfig,
    SignalDirection, SignalState,
};

/// Candidate → pending → confirmed/cancelled lifecycle of the absorption pattern.
///
/// At most one candidate exists at a time. While one is pending only
/// confirmation is evaluated.
#[derive(Debug, Clone)]
pub struct SignalStateMachine {
    config: SignalConfig,
    pending: Option<PendingCandidate>,
}

impl SignalStateMachine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    pub fn state(&self) -> SignalState {
        match self.pending.as_ref().map(|c| c.direction) {
            None => SignalState::Idle,
            Some(SignalDirection::UpperSweep) => SignalState::PendingUpper,
            Some(SignalDirection::LowerSweep) => SignalState::PendingLower,
        }
    }

    pub fn pending(&self) -> Option<&PendingCandidate> {
        self.pending.as_ref()
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Test a closed base bucket for candidacy.
    ///
    /// No-op unless idle and the baseline is ready. The upper sweep is checked
    /// before the lower one. Returns the direction of a newly opened candidate.
    pub fn evaluate_candidate(
        &mut self,
        bucket: &Bucket,
        snapshot: &ProfileSnapshot,
        swept_highs: SweepResult,
        swept_lows: SweepResult,
        baseline: &RollingWindow,
    ) -> Option<SignalDirection> {
        if self.pending.is_some() || !baseline.is_ready() {
            return None;
        }

        let mean_volume = baseline.mean_volume();
        let mean_abs_imbalance = baseline.mean_abs_imbalance();
        let delta_threshold = mean_abs_imbalance * self.config.delta_multiplier;
        let volume_spike = snapshot.total_volume > mean_volume * self.config.volume_multiplier;

        let upper = swept_highs.count >= self.config.min_levels_swept
            && snapshot.signed_imbalance > delta_threshold
            && volume_spike
            && bucket.close < snapshot.poc_price;

        let (direction, swept, sweep_price) = if upper {
            (SignalDirection::UpperSweep, swept_highs, bucket.high)
        } else {
            let lower = swept_lows.count >= self.config.min_levels_swept
                && snapshot.signed_imbalance < -delta_threshold
                && volume_spike
                && bucket.close > snapshot.poc_price;
            if !lower {
                debug!(
                    swept_highs = swept_highs.count,
                    swept_lows = swept_lows.count,
                    delta = snapshot.signed_imbalance,
                    volume = snapshot.total_volume,
                    "No candidate"
                );
                return None;
            }
            (SignalDirection::LowerSweep, swept_lows, bucket.low)
        };

        info!(
            direction = %direction,
            levels = swept.count,
            sweep_price,
            delta = snapshot.signed_imbalance,
            volume = snapshot.total_volume,
            poc = snapshot.poc_price,
            "🎯 Absorption candidate opened"
        );

        self.pending = Some(PendingCandidate {
            direction,
            anchor_bucket: bucket.clone(),
            anchor_snapshot: snapshot.clone(),
            swept,
            sweep_price,
            buckets_observed: 0,
            anchor_mean_volume: mean_volume,
            anchor_mean_abs_imbalance: mean_abs_imbalance,
        });

        Some(direction)
    }

    /// Resolve the pending candidate against the next closed base bucket.
    ///
    /// A bucket that extends past the sweep extreme cancels; otherwise the
    /// candidate confirms at once and its swept pivots leave the pool.
    pub fn evaluate_confirmation(&mut self, bucket: &Bucket, pivots: &mut PivotTracker) -> ConfirmationOutcome {
        let Some(mut candidate) = self.pending.take() else {
            return ConfirmationOutcome::NoCandidate;
        };

        candidate.buckets_observed += 1;
        let direction = candidate.direction;

        if candidate.buckets_observed > self.config.max_confirmation_buckets {
            info!(direction = %direction, observed = candidate.buckets_observed, "⌛ Absorption candidate timed out");
            return ConfirmationOutcome::Cancelled {
                direction,
                reason: CancelReason::Timeout,
            };
        }

        let extended = match direction {
            SignalDirection::UpperSweep => bucket.high > candidate.sweep_price,
            SignalDirection::LowerSweep => bucket.low < candidate.sweep_price,
        };

        if extended {
            info!(
                direction = %direction,
                sweep_price = candidate.sweep_price,
                high = bucket.high,
                low = bucket.low,
                "❌ Absorption candidate cancelled - sweep extended"
            );
            return ConfirmationOutcome::Cancelled {
                direction,
                reason: CancelReason::SweepExtended,
            };
        }

        let removed = pivots.remove_swept(direction.pivot_side(), &candidate.swept.pivots);
        let signal = AbsorptionSignal::from_candidate(candidate, bucket);

        info!(
            direction = %signal.direction,
            swing_level = signal.swing_level,
            sweep_price = signal.sweep_price,
            pivots_removed = removed,
            "✅ Absorption signal confirmed"
        );

        ConfirmationOutcome::Confirmed(Box::new(signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technical_analysis::structs::{Pivot, PivotSide};
    use std::collections::VecDeque;
    use crate::aggregation::structs::AggregateBucket;

    fn bucket(high: f64, low: f64, close: f64) -> Bucket {
        Bucket {
            open_time: 0,
            close_time: 59_999,
            open: close,
            high,
            low,
            close,
            volume: 0.0,
            closed: true,
        }
    }

    fn snapshot(total_volume: f64, signed_imbalance: f64, poc_price: f64) -> ProfileSnapshot {
        ProfileSnapshot {
            clusters: Vec::new(),
            poc_price,
            poc_volume: total_volume / 2.0,
            total_buy_volume: (total_volume + signed_imbalance) / 2.0,
            total_sell_volume: (total_volume - signed_imbalance) / 2.0,
            total_volume,
            signed_imbalance,
            trade_count: 10,
        }
    }

    /// Ready baseline: mean volume 10, mean |delta| 2
    fn baseline() -> RollingWindow {
        let mut window = RollingWindow::new(4);
        window.push(10.0, 2.0);
        window.push(10.0, -2.0);
        window
    }

    fn sweep(prices: &[f64]) -> SweepResult {
        SweepResult::from_pivots(
            prices
                .iter()
                .enumerate()
                .map(|(i, &price)| Pivot { price, timestamp: i as i64 * 900_000, index: i })
                .collect(),
        )
    }

    /// Tracker whose high pool holds 103.0 and 104.0
    fn tracker_with_highs() -> PivotTracker {
        let mut tracker = PivotTracker::new(1, 10);
        let rows = [(100.0, 90.0), (104.0, 91.0), (101.0, 90.5), (103.0, 92.0), (100.5, 91.5)];
        let mut history = VecDeque::new();
        for (i, (high, low)) in rows.into_iter().enumerate() {
            history.push_back(AggregateBucket {
                window_id: i as i64,
                open_time: i as i64 * 900_000,
                close_time: (i as i64 + 1) * 900_000 - 1,
                open: low,
                high,
                low,
                close: high,
                volume: 1.0,
                count: 15,
            });
            tracker.on_coarse_bucket_close(&history);
        }
        tracker
    }

    fn open_upper(machine: &mut SignalStateMachine, tracker: &PivotTracker) {
        let anchor = bucket(105.0, 102.0, 102.5);
        let opened = machine.evaluate_candidate(
            &anchor,
            &snapshot(30.0, 5.0, 103.0),
            tracker.swept_highs(anchor.high),
            tracker.swept_lows(anchor.low),
            &baseline(),
        );
        assert_eq!(opened, Some(SignalDirection::UpperSweep));
    }

    #[test]
    fn test_upper_candidate_requires_all_conditions() {
        let config = SignalConfig::default();
        let anchor = bucket(105.0, 102.0, 102.5);

        // Reference case opens a candidate
        let mut machine = SignalStateMachine::new(config);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(30.0, 5.0, 103.0), sweep(&[103.0, 104.0]), sweep(&[]), &baseline())
            .is_some());
        assert_eq!(machine.state(), SignalState::PendingUpper);

        // One swept level is below the minimum
        let mut machine = SignalStateMachine::new(config);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(30.0, 5.0, 103.0), sweep(&[104.0]), sweep(&[]), &baseline())
            .is_none());

        // Delta not above 2 * 1.5
        let mut machine = SignalStateMachine::new(config);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(30.0, 3.0, 103.0), sweep(&[103.0, 104.0]), sweep(&[]), &baseline())
            .is_none());

        // Volume not above 10 * 2
        let mut machine = SignalStateMachine::new(config);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(20.0, 5.0, 103.0), sweep(&[103.0, 104.0]), sweep(&[]), &baseline())
            .is_none());

        // Close above POC
        let mut machine = SignalStateMachine::new(config);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(30.0, 5.0, 102.0), sweep(&[103.0, 104.0]), sweep(&[]), &baseline())
            .is_none());
        assert_eq!(machine.state(), SignalState::Idle);
    }

    #[test]
    fn test_lower_candidate() {
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        let anchor = bucket(100.0, 95.0, 99.0);
        let opened = machine.evaluate_candidate(
            &anchor,
            &snapshot(25.0, -4.0, 98.0),
            sweep(&[]),
            sweep(&[96.0, 97.0]),
            &baseline(),
        );

        assert_eq!(opened, Some(SignalDirection::LowerSweep));
        assert_eq!(machine.state(), SignalState::PendingLower);
        assert_eq!(machine.pending().map(|c| c.sweep_price), Some(95.0));
        assert_eq!(machine.pending().map(|c| c.buckets_observed), Some(0));
    }

    #[test]
    fn test_candidate_requires_ready_baseline() {
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        let mut cold = RollingWindow::new(10);
        cold.push(1.0, 0.1);

        let anchor = bucket(105.0, 102.0, 102.5);
        assert!(machine
            .evaluate_candidate(&anchor, &snapshot(30.0, 5.0, 103.0), sweep(&[103.0, 104.0]), sweep(&[]), &cold)
            .is_none());
    }

    #[test]
    fn test_pending_blocks_new_candidacy() {
        let tracker = tracker_with_highs();
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        open_upper(&mut machine, &tracker);

        let before = machine.pending().cloned();
        let lower = bucket(100.0, 95.0, 99.0);
        let second = machine.evaluate_candidate(&lower, &snapshot(25.0, -4.0, 98.0), sweep(&[]), sweep(&[96.0, 97.0]), &baseline());

        assert!(second.is_none());
        assert_eq!(machine.state(), SignalState::PendingUpper);
        assert_eq!(machine.pending().cloned(), before);
    }

    #[test]
    fn test_extension_cancels_and_keeps_pool() {
        let mut tracker = tracker_with_highs();
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        open_upper(&mut machine, &tracker);

        let outcome = machine.evaluate_confirmation(&bucket(106.0, 103.0, 104.0), &mut tracker);
        assert_eq!(
            outcome,
            ConfirmationOutcome::Cancelled {
                direction: SignalDirection::UpperSweep,
                reason: CancelReason::SweepExtended,
            }
        );
        assert_eq!(machine.state(), SignalState::Idle);
        assert_eq!(tracker.pool(PivotSide::High).len(), 2);
    }

    #[test]
    fn test_no_extension_confirms_and_consumes_pool() {
        let mut tracker = tracker_with_highs();
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        open_upper(&mut machine, &tracker);

        let outcome = machine.evaluate_confirmation(&bucket(104.9, 102.0, 102.2), &mut tracker);
        let ConfirmationOutcome::Confirmed(signal) = outcome else {
            panic!("expected confirmation, got {:?}", outcome);
        };

        assert_eq!(signal.direction, SignalDirection::UpperSweep);
        assert_eq!(signal.swept_prices, vec![103.0, 104.0]);
        assert_eq!(signal.swing_level, 104.0);
        assert_eq!(signal.sweep_price, 105.0);
        assert_eq!(signal.volume_ratio, 3.0);
        assert_eq!(signal.imbalance_ratio, 2.5);
        assert_eq!(machine.state(), SignalState::Idle);
        assert!(tracker.pool(PivotSide::High).is_empty());
    }

    #[test]
    fn test_confirmation_without_candidate() {
        let mut tracker = PivotTracker::new(1, 10);
        let mut machine = SignalStateMachine::new(SignalConfig::default());
        assert_eq!(
            machine.evaluate_confirmation(&bucket(1.0, 0.5, 0.7), &mut tracker),
            ConfirmationOutcome::NoCandidate
        );
    }
}
