use serde::{Deserialize, Serialize};

/// A single executed trade from the aggregated trade stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub quantity: f64,
    /// True when the aggressor sold into a resting bid
    pub taker_is_seller: bool,
}

impl Trade {
    pub fn new(price: f64, quantity: f64, taker_is_seller: bool) -> Self {
        Self {
            price,
            quantity,
            taker_is_seller,
        }
    }
}

/// Price key for ordered cluster storage.
/// Integer multiple of the cluster size so equal levels compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey(i64);

impl PriceKey {
    /// Snap a price to the nearest multiple of `cluster_size`
    pub fn from_price(price: f64, cluster_size: f64) -> Self {
        Self((price / cluster_size).round() as i64)
    }

    /// Price of this level
    pub fn to_price(self, cluster_size: f64) -> f64 {
        self.0 as f64 * cluster_size
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

/// Trade flow accumulated at one snapped price level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceCluster {
    pub price: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
}

impl PriceCluster {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            buy_volume: 0.0,
            sell_volume: 0.0,
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.buy_volume + self.sell_volume
    }

    /// Buy minus sell volume
    pub fn imbalance(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }
}

/// Finalized profile of one base bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Clusters in ascending price order
    pub clusters: Vec<PriceCluster>,
    /// Point of control: price of the cluster with the most volume
    pub poc_price: f64,
    pub poc_volume: f64,
    pub total_buy_volume: f64,
    pub total_sell_volume: f64,
    pub total_volume: f64,
    /// Aggressor buy volume minus aggressor sell volume
    pub signed_imbalance: f64,
    pub trade_count: u64,
}

impl ProfileSnapshot {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Cluster at a snapped price, if any flow traded there
    pub fn cluster_at(&self, price: f64) -> Option<&PriceCluster> {
        self.clusters.iter().find(|c| (c.price - price).abs() < f64::EPSILON * price.abs().max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_key_snapping() {
        assert_eq!(PriceKey::from_price(100.0, 0.5).to_price(0.5), 100.0);
        assert_eq!(PriceKey::from_price(100.4, 0.5).to_price(0.5), 100.5);
        assert_eq!(PriceKey::from_price(100.2, 0.5).to_price(0.5), 100.0);
        assert_eq!(PriceKey::from_price(50_012.0, 10.0).to_price(10.0), 50_010.0);
        assert_eq!(PriceKey::from_price(50_015.0, 10.0).to_price(10.0), 50_020.0);
    }

    #[test]
    fn test_price_key_ordering() {
        let low = PriceKey::from_price(99.0, 1.0);
        let high = PriceKey::from_price(101.0, 1.0);
        assert!(low < high);
        assert_eq!(high.raw() - low.raw(), 2);
    }

    #[test]
    fn test_cluster_derived_values() {
        let cluster = PriceCluster {
            price: 100.0,
            buy_volume: 2.5,
            sell_volume: 4.0,
        };
        assert_eq!(cluster.total_volume(), 6.5);
        assert_eq!(cluster.imbalance(), -1.5);
    }
}
