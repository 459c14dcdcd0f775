use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::aggregation::structs::BaseUpdate;
use crate::config::ConfigError;
use crate::volume_profile::structs::Trade;

/// Streams the detector subscribes to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    /// Aggregated trades (feeds the volume profile)
    AggTrade,
    /// Kline/candlestick updates at the given interval (feeds the aggregator)
    Kline(String),
}

impl StreamType {
    /// Binance stream suffix for this stream type
    pub fn binance_suffix(&self) -> String {
        match self {
            StreamType::AggTrade => "aggTrade".to_string(),
            StreamType::Kline(interval) => format!("kline_{}", interval),
        }
    }
}

/// WebSocket connection status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Reconnecting { attempt } => write!(f, "Reconnecting (attempt {})", attempt),
        }
    }
}

/// `[stream]` section of config.toml
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Binance USDⓈ-M futures WebSocket endpoint
    pub base_url: String,
    /// Fixed delay before reconnecting after a disconnect
    pub reconnect_delay_secs: u64,
    pub ping_interval_secs: u64,
}

impl StreamConfig {
    /// Zero intervals would spin the reconnect loop or panic the ping timer
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("stream base_url cannot be empty".to_string()));
        }
        if self.reconnect_delay_secs < 1 {
            return Err(ConfigError::Invalid("reconnect_delay_secs must be at least 1".to_string()));
        }
        if self.ping_interval_secs < 1 {
            return Err(ConfigError::Invalid("ping_interval_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "wss://fstream.binance.com".to_string(),
            reconnect_delay_secs: 5,
            ping_interval_secs: 30,
        }
    }
}

/// WebSocket error types
#[derive(Error, Debug, Clone)]
pub enum WebSocketError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl WebSocketError {
    /// Whether the stream loop should reconnect after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WebSocketError::Connection(_))
    }
}

/// Parsed market event ready for the detector
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    Trade(Trade),
    BaseUpdate(BaseUpdate),
}

/// Connection statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub messages_received: u64,
    pub messages_parsed: u64,
    pub parse_errors: u64,
    pub connection_count: u32,
    pub last_message_time: Option<i64>,
    pub connection_established_time: Option<i64>,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(&mut self) {
        self.messages_received += 1;
        self.last_message_time = Some(chrono::Utc::now().timestamp_millis());
    }

    pub fn record_parsed(&mut self) {
        self.messages_parsed += 1;
    }

    pub fn record_parse_error(&mut self) {
        self.parse_errors += 1;
    }

    pub fn record_connection(&mut self) {
        self.connection_count += 1;
        self.connection_established_time = Some(chrono::Utc::now().timestamp_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_type_binance_suffix() {
        assert_eq!(StreamType::AggTrade.binance_suffix(), "aggTrade");
        assert_eq!(StreamType::Kline("1m".to_string()).binance_suffix(), "kline_1m");
    }

    #[test]
    fn test_websocket_error_recoverable() {
        assert!(WebSocketError::Connection("test".to_string()).is_recoverable());
        assert!(!WebSocketError::Parse("test".to_string()).is_recoverable());
        assert!(!WebSocketError::Channel("test".to_string()).is_recoverable());
    }

    #[test]
    fn test_connection_stats() {
        let mut stats = ConnectionStats::new();

        stats.record_message();
        stats.record_parsed();
        stats.record_message();
        stats.record_parse_error();
        stats.record_connection();

        assert_eq!(stats.messages_received, 2);
        assert_eq!(stats.messages_parsed, 1);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.connection_count, 1);
        assert!(stats.last_message_time.is_some());
    }

    #[test]
    fn test_stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.base_url, "wss://fstream.binance.com");
        assert_eq!(config.reconnect_delay_secs, 5);
        assert!(config.validate().is_ok());
        assert_eq!(ConnectionStatus::Reconnecting { attempt: 2 }.to_string(), "Reconnecting (attempt 2)");
    }

    #[test]
    fn test_stream_config_rejects_zero_intervals() {
        let no_delay = StreamConfig { reconnect_delay_secs: 0, ..Default::default() };
        assert!(matches!(no_delay.validate(), Err(ConfigError::Invalid(_))));

        let no_ping = StreamConfig { ping_interval_secs: 0, ..Default::default() };
        assert!(matches!(no_ping.validate(), Err(ConfigError::Invalid(_))));

        let no_url = StreamConfig { base_url: " ".to_string(), ..Default::default() };
        assert!(no_url.validate().is_err());
    }
}
