use std::collections::VecDeque;

use tracing::debug;

use super::structs::{AggregateBucket, BaseUpdate, Bucket, Seconds, TimestampMS};

/// Close events produced by a single base update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatorOutput {
    /// Set when the update closed its base interval
    pub base_closed: Option<Bucket>,
    /// Set when the closed base bucket rolled the coarse window over
    pub coarse_closed: Option<AggregateBucket>,
}

impl AggregatorOutput {
    pub fn is_empty(&self) -> bool {
        self.base_closed.is_none() && self.coarse_closed.is_none()
    }
}

/// Builds base buckets from streamed interval updates and rolls closed base
/// buckets into coarse windows, keeping a bounded history of finished windows.
#[derive(Debug, Clone)]
pub struct IntervalAggregator {
    /// Coarse window length in milliseconds
    window_ms: i64,
    /// In-progress base bucket (latest non-closed update)
    current_base: Option<Bucket>,
    /// Coarse bucket being built
    current_coarse: Option<AggregateBucket>,
    /// Finalized coarse buckets, oldest first
    history: VecDeque<AggregateBucket>,
    /// Maximum number of finalized coarse buckets retained
    capacity: usize,
}

impl IntervalAggregator {
    /// Create an aggregator for the given coarse window and retained history length
    pub fn new(coarse_window_seconds: Seconds, capacity: usize) -> Self {
        Self {
            window_ms: (coarse_window_seconds * 1000) as i64,
            current_base: None,
            current_coarse: None,
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Ingest one base-interval update.
    ///
    /// Non-closed updates only refresh the in-progress base bucket. A closed
    /// update yields the immutable base bucket and, when its coarse window id
    /// differs from the open coarse bucket, the finalized coarse bucket too.
    pub fn ingest_base_update(&mut self, update: &BaseUpdate) -> AggregatorOutput {
        let mut bucket = Bucket::from_update(update);

        if !update.is_closed {
            self.current_base = Some(bucket);
            return AggregatorOutput::default();
        }

        self.current_base = None;
        bucket.closed = true;

        let coarse_closed = self.roll_into_coarse(&bucket);
        AggregatorOutput {
            base_closed: Some(bucket),
            coarse_closed,
        }
    }

    /// Coarse window id of a timestamp
    pub fn window_id(&self, timestamp: TimestampMS) -> i64 {
        timestamp.div_euclid(self.window_ms)
    }

    fn roll_into_coarse(&mut self, bucket: &Bucket) -> Option<AggregateBucket> {
        let window_id = self.window_id(bucket.open_time);

        match self.current_coarse.as_mut() {
            Some(current) if current.window_id == window_id => {
                current.merge(bucket);
                None
            }
            Some(_) => {
                let finished = self.finalize_current();
                self.current_coarse = Some(AggregateBucket::start(window_id, self.window_ms, bucket));
                finished
            }
            None => {
                self.current_coarse = Some(AggregateBucket::start(window_id, self.window_ms, bucket));
                None
            }
        }
    }

    /// Move the open coarse bucket into the history and return a copy
    fn finalize_current(&mut self) -> Option<AggregateBucket> {
        let finished = self.current_coarse.take()?;

        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(finished.clone());

        debug!(
            window_id = finished.window_id,
            members = finished.count,
            high = finished.high,
            low = finished.low,
            history = self.history.len(),
            "🔚 Coarse bucket finalized"
        );

        Some(finished)
    }

    /// Finalized coarse buckets, oldest first
    pub fn history(&self) -> &VecDeque<AggregateBucket> {
        &self.history
    }

    /// The in-progress base bucket, if an open update has been seen
    pub fn current_base(&self) -> Option<&Bucket> {
        self.current_base.as_ref()
    }

    /// The coarse bucket still accepting base buckets
    pub fn current_coarse(&self) -> Option<&AggregateBucket> {
        self.current_coarse.as_ref()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
