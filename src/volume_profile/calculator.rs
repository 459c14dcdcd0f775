use std::collections::BTreeMap;

use tracing::debug;

use super::structs::{PriceCluster, PriceKey, ProfileSnapshot, Trade};

/// Per-bucket volume profile built from individual trades.
///
/// Trades are clustered at `round(price / cluster_size) * cluster_size`.
/// The builder is finalized once per base bucket and then reset.
#[derive(Debug, Clone)]
pub struct VolumeProfileBuilder {
    cluster_size: f64,
    /// Clusters keyed by snapped price (ascending)
    clusters: BTreeMap<PriceKey, PriceCluster>,
    total_buy_volume: f64,
    total_sell_volume: f64,
    trade_count: u64,
}

impl VolumeProfileBuilder {
    pub fn new(cluster_size: f64) -> Self {
        debug_assert!(cluster_size > 0.0, "cluster size must be positive");
        Self {
            cluster_size,
            clusters: BTreeMap::new(),
            total_buy_volume: 0.0,
            total_sell_volume: 0.0,
            trade_count: 0,
        }
    }

    /// Add one trade to its price cluster
    pub fn ingest_trade(&mut self, trade: &Trade) {
        debug_assert!(
            trade.price.is_finite() && trade.quantity.is_finite(),
            "trade price and quantity must be finite"
        );

        let key = PriceKey::from_price(trade.price, self.cluster_size);
        let cluster_size = self.cluster_size;
        let cluster = self.clusters.entry(key).or_insert_with(|| {
            let price = key.to_price(cluster_size);
            debug!(price, "New price cluster");
            PriceCluster::new(price)
        });

        if trade.taker_is_seller {
            cluster.sell_volume += trade.quantity;
            self.total_sell_volume += trade.quantity;
        } else {
            cluster.buy_volume += trade.quantity;
            self.total_buy_volume += trade.quantity;
        }
        self.trade_count += 1;
    }

    /// Snapshot of the current bucket, or None when no trade was recorded
    pub fn finalize(&self) -> Option<ProfileSnapshot> {
        if self.trade_count == 0 {
            return None;
        }

        let clusters: Vec<PriceCluster> = self.clusters.values().copied().collect();

        // Ascending scan with strict comparison keeps the lowest price on ties
        let mut poc: Option<&PriceCluster> = None;
        for cluster in &clusters {
            match poc {
                Some(best) if cluster.total_volume() <= best.total_volume() => {}
                _ => poc = Some(cluster),
            }
        }
        let (poc_price, poc_volume) = poc
            .map(|c| (c.price, c.total_volume()))
            .unwrap_or((0.0, 0.0));

        Some(ProfileSnapshot {
            poc_price,
            poc_volume,
            total_buy_volume: self.total_buy_volume,
            total_sell_volume: self.total_sell_volume,
            total_volume: self.total_buy_volume + self.total_sell_volume,
            signed_imbalance: self.total_buy_volume - self.total_sell_volume,
            trade_count: self.trade_count,
            clusters,
        })
    }

    /// Clear all clusters and totals for the next bucket
    pub fn reset(&mut self) {
        self.clusters.clear();
        self.total_buy_volume = 0.0;
        self.total_sell_volume = 0.0;
        self.trade_count = 0;
    }

    pub fn cluster_size(&self) -> f64 {
        self.cluster_size
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }
}
