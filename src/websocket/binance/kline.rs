use serde::{Deserialize, Serialize};

use crate::aggregation::structs::BaseUpdate;
use crate::websocket::types::WebSocketError;
use super::parse_decimal;

/// Binance kline WebSocket event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceKlineEvent {
    /// Event type - should be "kline"
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (timestamp in milliseconds)
    #[serde(rename = "E")]
    pub event_time: i64,

    #[serde(rename = "s")]
    pub symbol: String,

    #[serde(rename = "k")]
    pub kline: BinanceKlineData,
}

/// Kline payload; fields the detector does not use are skipped
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceKlineData {
    /// Kline start time (timestamp in milliseconds)
    #[serde(rename = "t")]
    pub start_time: i64,

    /// Kline close time (timestamp in milliseconds)
    #[serde(rename = "T")]
    pub close_time: i64,

    #[serde(rename = "i")]
    pub interval: String,

    #[serde(rename = "o")]
    pub open: String,

    #[serde(rename = "c")]
    pub close: String,

    #[serde(rename = "h")]
    pub high: String,

    #[serde(rename = "l")]
    pub low: String,

    /// Base asset volume
    #[serde(rename = "v")]
    pub volume: String,

    #[serde(rename = "n", default)]
    pub number_of_trades: i64,

    /// True once the interval is complete
    #[serde(rename = "x")]
    pub is_kline_closed: bool,
}

impl BinanceKlineData {
    /// Convert to the aggregator's base-interval update
    pub fn to_base_update(&self) -> Result<BaseUpdate, WebSocketError> {
        Ok(BaseUpdate::new_from_values(
            self.start_time,
            self.close_time,
            parse_decimal("open price", &self.open)?,
            parse_decimal("high price", &self.high)?,
            parse_decimal("low price", &self.low)?,
            parse_decimal("close price", &self.close)?,
            parse_decimal("volume", &self.volume)?,
            self.is_kline_closed,
        ))
    }
}
