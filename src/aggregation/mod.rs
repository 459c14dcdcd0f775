pub mod aggregator;
pub mod structs;

pub use aggregator::{AggregatorOutput, IntervalAggregator};
pub use structs::{format_timestamp, AggregateBucket, BaseUpdate, Bucket, Seconds, TimestampMS};
