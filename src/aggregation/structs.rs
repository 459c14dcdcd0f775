use serde::{Deserialize, Serialize};

pub type TimestampMS = i64;
pub type Seconds = u64;

/// One update for the in-progress base interval, as delivered by the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseUpdate {
    pub open_time: TimestampMS,
    pub close_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

impl BaseUpdate {
    #[allow(clippy::too_many_arguments)]
    pub fn new_from_values(
        open_time: TimestampMS,
        close_time: TimestampMS,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        is_closed: bool,
    ) -> Self {
        Self {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
            is_closed,
        }
    }
}

/// OHLCV bucket at the base granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub open_time: TimestampMS,
    pub close_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub closed: bool,
}

impl Bucket {
    pub fn from_update(update: &BaseUpdate) -> Self {
        Self {
            open_time: update.open_time,
            close_time: update.close_time,
            open: update.open,
            high: update.high,
            low: update.low,
            close: update.close,
            volume: update.volume,
            closed: update.is_closed,
        }
    }

    /// Human readable UTC open time, used in logs and signal text
    pub fn open_time_utc(&self) -> String {
        format_timestamp(self.open_time)
    }
}

/// Coarse-granularity rollup of consecutive base buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// floor(open_time / coarse window length)
    pub window_id: i64,
    /// Aligned start of the coarse window
    pub open_time: TimestampMS,
    /// Close time of the latest merged base bucket
    pub close_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Number of base buckets merged into this window
    pub count: u32,
}

impl AggregateBucket {
    /// Start a coarse window from its first base bucket
    pub fn start(window_id: i64, window_ms: i64, first: &Bucket) -> Self {
        Self {
            window_id,
            open_time: window_id * window_ms,
            close_time: first.close_time,
            open: first.open,
            high: first.high,
            low: first.low,
            close: first.close,
            volume: first.volume,
            count: 1,
        }
    }

    /// Merge a later base bucket of the same window
    pub fn merge(&mut self, bucket: &Bucket) {
        self.high = self.high.max(bucket.high);
        self.low = self.low.min(bucket.low);
        self.close = bucket.close;
        self.close_time = bucket.close_time;
        self.volume += bucket.volume;
        self.count += 1;
    }
}

/// Format a millisecond timestamp as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(timestamp: TimestampMS) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}
