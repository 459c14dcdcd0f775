use serde::{Deserialize, Serialize};

use crate::volume_profile::structs::Trade;
use crate::websocket::types::WebSocketError;
use super::parse_decimal;

/// Binance aggregated trade event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceAggTrade {
    /// Event type - should be "aggTrade"
    #[serde(rename = "e")]
    pub event_type: String,

    #[serde(rename = "E")]
    pub event_time: i64,

    #[serde(rename = "s")]
    pub symbol: String,

    #[serde(rename = "a")]
    pub agg_trade_id: i64,

    #[serde(rename = "p")]
    pub price: String,

    #[serde(rename = "q")]
    pub quantity: String,

    #[serde(rename = "f")]
    pub first_trade_id: i64,

    #[serde(rename = "l")]
    pub last_trade_id: i64,

    #[serde(rename = "T")]
    pub trade_time: i64,

    /// Is the buyer the market maker? If so the aggressor sold.
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

impl BinanceAggTrade {
    /// Convert to the volume profile's trade record
    pub fn to_trade(&self) -> Result<Trade, WebSocketError> {
        let price = parse_decimal("trade price", &self.price)?;
        let quantity = parse_decimal("trade quantity", &self.quantity)?;
        Ok(Trade::new(price, quantity, self.is_buyer_maker))
    }
}
