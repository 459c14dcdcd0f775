pub mod binance;
pub mod connection;
pub mod types;

pub use binance::{parse_stream_message, BinanceAggTrade, BinanceKlineEvent};
pub use connection::{build_stream_url, run_stream, ConnectionManager};
pub use types::{ConnectionStatus, MarketEvent, StreamConfig, StreamType, WebSocketError};
