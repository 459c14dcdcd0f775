#![allow(dead_code)]

use std::collections::VecDeque;

use absorption_feeder::aggregation::structs::{AggregateBucket, BaseUpdate};
use absorption_feeder::config::DetectorConfig;
use absorption_feeder::engine::{AbsorptionEngine, EngineEvent};
use absorption_feeder::volume_profile::structs::Trade;

pub const MINUTE_MS: i64 = 60_000;

/// Three one-minute buckets per coarse window, lookback 1, baseline ready after two buckets
pub fn create_test_config() -> DetectorConfig {
    DetectorConfig {
        price_cluster_size: 1.0,
        base_interval_secs: 60,
        coarse_window_secs: 180,
        pivot_lookback: 1,
        pivot_pool_max_size: 10,
        rolling_window_size: 4,
        min_levels_swept: 2,
        delta_multiplier: 1.5,
        volume_multiplier: 2.0,
        max_confirmation_buckets: 2,
        coarse_history_retained: 20,
    }
}

/// Closed one-minute update
pub fn create_closed_update(minute: i64, high: f64, low: f64, close: f64) -> BaseUpdate {
    BaseUpdate::new_from_values(
        minute * MINUTE_MS,
        (minute + 1) * MINUTE_MS - 1,
        close,
        high,
        low,
        close,
        1.0,
        true,
    )
}

pub fn create_coarse_bucket(index: i64, high: f64, low: f64) -> AggregateBucket {
    AggregateBucket {
        window_id: index,
        open_time: index * 3 * MINUTE_MS,
        close_time: (index + 1) * 3 * MINUTE_MS - 1,
        open: low,
        high,
        low,
        close: high,
        volume: 30.0,
        count: 3,
    }
}

pub fn coarse_history(rows: &[(f64, f64)]) -> VecDeque<AggregateBucket> {
    rows.iter()
        .enumerate()
        .map(|(i, &(high, low))| create_coarse_bucket(i as i64, high, low))
        .collect()
}

/// Quiet bucket flow: volume 10, delta +2
pub fn baseline_trades() -> Vec<Trade> {
    vec![
        Trade::new(98.0, 6.0, false),
        Trade::new(98.2, 4.0, true),
    ]
}

/// Heavy buying into the sweep: volume 45, delta +35, POC at 100
pub fn sweep_trades() -> Vec<Trade> {
    vec![
        Trade::new(100.1, 25.0, false),
        Trade::new(99.9, 15.0, false),
        Trade::new(99.0, 5.0, true),
    ]
}

/// Feed one bucket's trades and its closing update
pub fn feed_bucket(engine: &mut AbsorptionEngine, trades: &[Trade], update: &BaseUpdate) -> Vec<EngineEvent> {
    for trade in trades {
        engine.on_trade(trade);
    }
    engine.on_base_update(update)
}

/// Coarse highs 100, 104, 101, 103, 100.5 with flat lows; yields high pivots at 104 and 103
pub const COARSE_HIGHS: [f64; 5] = [100.0, 104.0, 101.0, 103.0, 100.5];

/// Run the engine up to an open upper-sweep candidate with sweep price 105.
///
/// Minutes 0..=15 build the pivot pools and baseline; minute 16 sweeps both
/// high pivots on heavy buying and closes below its POC.
pub fn prime_upper_candidate(engine: &mut AbsorptionEngine) -> Vec<EngineEvent> {
    let mut events = Vec::new();

    for (window, high) in COARSE_HIGHS.iter().enumerate() {
        for i in 0..3 {
            let minute = window as i64 * 3 + i;
            events.extend(feed_bucket(engine, &baseline_trades(), &create_closed_update(minute, *high, 95.0, 98.0)));
        }
    }

    // First bucket of the sixth window finalizes the fifth and confirms the 103 pivot
    events.extend(feed_bucket(engine, &baseline_trades(), &create_closed_update(15, 100.5, 95.0, 98.0)));

    events.extend(feed_bucket(engine, &sweep_trades(), &create_closed_update(16, 105.0, 97.0, 99.0)));
    events
}

/// Heavy selling into the sweep: volume 45, delta -35, POC at 100
pub fn selling_sweep_trades() -> Vec<Trade> {
    vec![
        Trade::new(99.9, 25.0, true),
        Trade::new(100.1, 15.0, true),
        Trade::new(101.0, 5.0, false),
    ]
}

/// Coarse lows 100, 96, 99, 97, 99.5 with flat highs; yields low pivots at 96 and 97
pub const COARSE_LOWS: [f64; 5] = [100.0, 96.0, 99.0, 97.0, 99.5];

/// Mirror of [`prime_upper_candidate`]: opens a lower-sweep candidate with sweep price 95.
///
/// Minute 16 runs both low pivots on heavy selling and closes above its POC.
pub fn prime_lower_candidate(engine: &mut AbsorptionEngine) -> Vec<EngineEvent> {
    let mut events = Vec::new();

    for (window, low) in COARSE_LOWS.iter().enumerate() {
        for i in 0..3 {
            let minute = window as i64 * 3 + i;
            events.extend(feed_bucket(engine, &baseline_trades(), &create_closed_update(minute, 105.0, *low, 102.0)));
        }
    }

    events.extend(feed_bucket(engine, &baseline_trades(), &create_closed_update(15, 105.0, 99.5, 102.0)));

    events.extend(feed_bucket(engine, &selling_sweep_trades(), &create_closed_update(16, 103.0, 95.0, 101.0)));
    events
}

/// Recorded-shape combined stream aggTrade payload
pub fn agg_trade_payload(price: &str, quantity: &str, is_buyer_maker: bool, trade_time: i64) -> String {
    format!(
        r#"{{"stream":"btcusdt@aggTrade","data":{{"e":"aggTrade","E":{},"s":"BTCUSDT","a":26129,"p":"{}","q":"{}","f":100,"l":105,"T":{},"m":{}}}}}"#,
        trade_time + 5,
        price,
        quantity,
        trade_time,
        is_buyer_maker
    )
}

/// Recorded-shape combined stream one-minute kline payload
pub fn kline_payload(minute: i64, ohlc: [&str; 4], volume: &str, closed: bool) -> String {
    let [open, high, low, close] = ohlc;
    format!(
        r#"{{"stream":"btcusdt@kline_1m","data":{{"e":"kline","E":{},"s":"BTCUSDT","k":{{"t":{},"T":{},"s":"BTCUSDT","i":"1m","f":100,"L":200,"o":"{}","c":"{}","h":"{}","l":"{}","v":"{}","n":101,"x":{},"q":"1.0","V":"0.5","Q":"0.5","B":"0"}}}}}}"#,
        (minute + 1) * MINUTE_MS,
        minute * MINUTE_MS,
        (minute + 1) * MINUTE_MS - 1,
        open,
        close,
        high,
        low,
        volume,
        closed
    )
}
