pub mod agg_trade;
pub mod kline;

pub use agg_trade::BinanceAggTrade;
pub use kline::{BinanceKlineData, BinanceKlineEvent};

use serde::Deserialize;

use crate::websocket::types::{MarketEvent, WebSocketError};

/// Combined stream envelope: `{"stream": "btcusdt@aggTrade", "data": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceCombinedStreamMessage {
    pub stream: String,
    pub data: serde_json::Value,
}

impl BinanceCombinedStreamMessage {
    pub fn parse(payload: &str) -> Result<Self, WebSocketError> {
        serde_json::from_str(payload)
            .map_err(|e| WebSocketError::Parse(format!("Failed to parse combined stream message: {}", e)))
    }
}

/// Parse a combined stream message into a detector input.
///
/// Dispatches on the inner event type. Prices that are not finite numbers are
/// rejected here so they never reach the detector.
pub fn parse_stream_message(payload: &str) -> Result<MarketEvent, WebSocketError> {
    let envelope = BinanceCombinedStreamMessage::parse(payload)?;
    let event_type = envelope
        .data
        .get("e")
        .and_then(|e| e.as_str())
        .map(str::to_owned)
        .ok_or_else(|| WebSocketError::Parse(format!("Missing event type on stream {}", envelope.stream)))?;

    match event_type.as_str() {
        "aggTrade" => {
            let trade: BinanceAggTrade = serde_json::from_value(envelope.data)
                .map_err(|e| WebSocketError::Parse(format!("Failed to parse aggTrade message: {}", e)))?;
            Ok(MarketEvent::Trade(trade.to_trade()?))
        }
        "kline" => {
            let event: BinanceKlineEvent = serde_json::from_value(envelope.data)
                .map_err(|e| WebSocketError::Parse(format!("Failed to parse kline message: {}", e)))?;
            Ok(MarketEvent::BaseUpdate(event.kline.to_base_update()?))
        }
        other => Err(WebSocketError::Parse(format!("Unsupported event type: {}", other))),
    }
}

/// Parse a decimal string field, rejecting non-finite values
pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<f64, WebSocketError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| WebSocketError::Parse(format!("Invalid {}: {}", field, value)))
}
