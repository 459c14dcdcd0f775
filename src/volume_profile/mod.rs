/// Volume Profile Module
///
/// Clusters the trade flow of one base bucket into price levels and derives
/// the point of control and aggressor imbalance when the bucket closes.
pub mod calculator;
pub mod structs;

pub use calculator::VolumeProfileBuilder;
pub use structs::{PriceCluster, PriceKey, ProfileSnapshot, Trade};
