use serde::Serialize;
use tracing::debug;

use crate::aggregation::aggregator::IntervalAggregator;
use crate::aggregation::structs::{AggregateBucket, BaseUpdate, Bucket};
use crate::config::DetectorConfig;
use crate::signal::state_machine::SignalStateMachine;
use crate::signal::structs::{
    AbsorptionSignal, CancelReason, ConfirmationOutcome, PendingCandidate, SignalDirection, SignalState,
};
use crate::technical_analysis::pivots::PivotTracker;
use crate::technical_analysis::rolling_window::RollingWindow;
use crate::technical_analysis::structs::{Pivot, PivotSide};
use crate::volume_profile::calculator::VolumeProfileBuilder;
use crate::volume_profile::structs::Trade;

/// Structured output of the detector, in emission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    BaseBucketClosed(Bucket),
    CoarseBucketClosed(AggregateBucket),
    PivotConfirmed {
        side: PivotSide,
        pivot: Pivot,
    },
    CandidateOpened {
        direction: SignalDirection,
        sweep_price: f64,
    },
    CandidateCancelled {
        direction: SignalDirection,
        reason: CancelReason,
    },
    SignalConfirmed(Box<AbsorptionSignal>),
}

/// Single-instrument detector core.
///
/// Owns one instance of every component and drives them from the trade and
/// base-interval streams. Not thread safe; callers serialize both streams
/// into one ordered sequence of calls.
#[derive(Debug, Clone)]
pub struct AbsorptionEngine {
    aggregator: IntervalAggregator,
    profile: VolumeProfileBuilder,
    rolling: RollingWindow,
    pivots: PivotTracker,
    signals: SignalStateMachine,
}

impl AbsorptionEngine {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            aggregator: IntervalAggregator::new(config.coarse_window_secs, config.coarse_history_retained),
            profile: VolumeProfileBuilder::new(config.price_cluster_size),
            rolling: RollingWindow::new(config.rolling_window_size),
            pivots: PivotTracker::new(config.pivot_lookback, config.pivot_pool_max_size),
            signals: SignalStateMachine::new(config.signal_config()),
        }
    }

    /// Record one trade in the current base bucket's profile
    pub fn on_trade(&mut self, trade: &Trade) {
        self.profile.ingest_trade(trade);
    }

    /// Feed one base-interval update and return the resulting events
    pub fn on_base_update(&mut self, update: &BaseUpdate) -> Vec<EngineEvent> {
        let output = self.aggregator.ingest_base_update(update);
        let mut events = Vec::new();

        if let Some(bucket) = output.base_closed {
            self.on_base_close(bucket, &mut events);
        }

        if let Some(coarse) = output.coarse_closed {
            events.push(EngineEvent::CoarseBucketClosed(coarse));
            for (side, pivot) in self.pivots.on_coarse_bucket_close(self.aggregator.history()) {
                events.push(EngineEvent::PivotConfirmed { side, pivot });
            }
        }

        events
    }

    fn on_base_close(&mut self, bucket: Bucket, events: &mut Vec<EngineEvent>) {
        events.push(EngineEvent::BaseBucketClosed(bucket.clone()));
        let snapshot = self.profile.finalize();

        if let Some(snapshot) = &snapshot {
            self.rolling.push(snapshot.total_volume, snapshot.signed_imbalance);
        } else {
            debug!(open_time = bucket.open_time, "Base bucket closed without trades");
        }

        if self.signals.pending().is_some() {
            match self.signals.evaluate_confirmation(&bucket, &mut self.pivots) {
                ConfirmationOutcome::Confirmed(signal) => events.push(EngineEvent::SignalConfirmed(signal)),
                ConfirmationOutcome::Cancelled { direction, reason } => {
                    events.push(EngineEvent::CandidateCancelled { direction, reason })
                }
                ConfirmationOutcome::NoCandidate => {}
            }
        } else if let Some(snapshot) = &snapshot {
            let swept_highs = self.pivots.swept_highs(bucket.high);
            let swept_lows = self.pivots.swept_lows(bucket.low);
            if let Some(direction) =
                self.signals
                    .evaluate_candidate(&bucket, snapshot, swept_highs, swept_lows, &self.rolling)
            {
                let sweep_price = match direction {
                    SignalDirection::UpperSweep => bucket.high,
                    SignalDirection::LowerSweep => bucket.low,
                };
                events.push(EngineEvent::CandidateOpened { direction, sweep_price });
            }
        }

        self.profile.reset();
    }

    pub fn state(&self) -> SignalState {
        self.signals.state()
    }

    pub fn pending(&self) -> Option<&PendingCandidate> {
        self.signals.pending()
    }

    pub fn pivots(&self) -> &PivotTracker {
        &self.pivots
    }

    pub fn rolling_window(&self) -> &RollingWindow {
        &self.rolling
    }

    pub fn aggregator(&self) -> &IntervalAggregator {
        &self.aggregator
    }

    pub fn profile(&self) -> &VolumeProfileBuilder {
        &self.profile
    }
}
