use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use kameo::actor::ActorRef;
use kameo::request::MessageSend;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::engine::actor::{DetectorActor, DetectorTell};
use crate::websocket::binance::parse_stream_message;
use crate::websocket::types::{
    ConnectionStats, ConnectionStatus, MarketEvent, StreamConfig, StreamType, WebSocketError,
};

/// Connection manager for the Binance combined stream
pub struct ConnectionManager {
    config: StreamConfig,
    stats: ConnectionStats,
    status: ConnectionStatus,
}

impl ConnectionManager {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            stats: ConnectionStats::new(),
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.config.reconnect_delay_secs)
    }

    /// Connect and keep reconnecting after a fixed delay.
    ///
    /// Returns only when the handler reports an error the stream cannot
    /// recover from (the consumer went away).
    pub async fn connect_with_retry<F, Fut>(&mut self, url: &str, mut message_handler: F) -> Result<(), WebSocketError>
    where
        F: FnMut(String) -> Fut,
        Fut: std::future::Future<Output = Result<(), WebSocketError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.status = if attempt == 1 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting { attempt }
            };

            match self.connect_once(url, &mut message_handler).await {
                Ok(()) => {
                    info!("WebSocket connection closed, reconnecting in {:?}", self.reconnect_delay());
                    attempt = 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(
                        status = %self.status,
                        "WebSocket connection failed (attempt {}): {}. Retrying in {:?}",
                        attempt, e, self.reconnect_delay()
                    );
                }
                Err(e) => {
                    self.status = ConnectionStatus::Disconnected;
                    error!("💥 WebSocket stream stopped: {}", e);
                    return Err(e);
                }
            }

            sleep(self.reconnect_delay()).await;
        }
    }

    /// Single connection attempt, running until the server closes the stream
    async fn connect_once<F, Fut>(&mut self, url: &str, message_handler: &mut F) -> Result<(), WebSocketError>
    where
        F: FnMut(String) -> Fut,
        Fut: std::future::Future<Output = Result<(), WebSocketError>>,
    {
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| WebSocketError::Connection(format!("Connect failed: {}", e)))?;

        self.status = ConnectionStatus::Connected;
        self.stats.record_connection();
        info!("✅ WebSocket connected successfully");

        let (mut write, mut read) = ws_stream.split();

        let ping_interval = Duration::from_secs(self.config.ping_interval_secs);
        let (ping_shutdown_tx, mut ping_shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(ping_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if write.send(Message::Ping(Vec::new())).await.is_err() {
                            debug!("Failed to send ping, connection likely dead");
                            break;
                        }
                    }
                    _ = ping_shutdown_rx.recv() => break,
                }
            }
        });

        let result = async {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        self.stats.record_message();
                        match message_handler(text).await {
                            Ok(()) => self.stats.record_parsed(),
                            Err(WebSocketError::Parse(e)) => {
                                self.stats.record_parse_error();
                                warn!("❌ Failed to parse message: {}", e);
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!("WebSocket closed by server: {:?}", frame);
                        break;
                    }
                    Ok(Message::Pong(_)) => debug!("🏓 Received WebSocket pong"),
                    Ok(_) => {}
                    Err(e) => {
                        return Err(WebSocketError::Connection(format!("WebSocket error: {}", e)));
                    }
                }
            }
            Ok(())
        }
        .await;

        let _ = ping_shutdown_tx.send(()).await;
        self.status = ConnectionStatus::Disconnected;
        info!(
            received = self.stats.messages_received,
            parsed = self.stats.messages_parsed,
            parse_errors = self.stats.parse_errors,
            "WebSocket disconnected"
        );

        result
    }
}

/// Combined stream URL for the trade and kline streams of one symbol
pub fn build_stream_url(config: &StreamConfig, symbol: &str, interval: &str) -> Result<String, WebSocketError> {
    validate_symbol(symbol)?;
    let symbol = symbol.to_lowercase();
    let streams = [StreamType::AggTrade, StreamType::Kline(interval.to_string())]
        .iter()
        .map(|stream| format!("{}@{}", symbol, stream.binance_suffix()))
        .collect::<Vec<_>>()
        .join("/");

    Ok(format!("{}/stream?streams={}", config.base_url.trim_end_matches('/'), streams))
}

/// Utility function to validate symbol format
pub fn validate_symbol(symbol: &str) -> Result<(), WebSocketError> {
    if symbol.is_empty() {
        return Err(WebSocketError::Subscription("Symbol cannot be empty".to_string()));
    }

    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WebSocketError::Subscription(format!(
            "Symbol '{}' contains invalid characters",
            symbol
        )));
    }

    Ok(())
}

/// Stream market data into the detector until the detector stops
pub async fn run_stream(
    config: StreamConfig,
    url: String,
    actor_ref: ActorRef<DetectorActor>,
) -> Result<(), WebSocketError> {
    let mut manager = ConnectionManager::new(config);

    manager
        .connect_with_retry(&url, move |text| {
            let actor_ref = actor_ref.clone();
            async move {
                let msg = match parse_stream_message(&text)? {
                    MarketEvent::Trade(trade) => DetectorTell::ProcessTrade(trade),
                    MarketEvent::BaseUpdate(update) => DetectorTell::ProcessBaseUpdate(update),
                };
                actor_ref
                    .tell(msg)
                    .send()
                    .await
                    .map_err(|e| WebSocketError::Channel(format!("Detector unavailable: {}", e)))
            }
        })
        .await
}
