use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::{ActorStopReason, BoxError};
use kameo::message::{Context, Message};
use kameo::{mailbox::unbounded::UnboundedMailbox, Actor};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::aggregation::structs::BaseUpdate;
use crate::config::DetectorConfig;
use crate::signal::structs::SignalState;
use crate::technical_analysis::structs::PivotSide;
use crate::volume_profile::structs::Trade;
use super::pipeline::{AbsorptionEngine, EngineEvent};

/// Detector Actor messages for telling (fire-and-forget)
#[derive(Debug, Clone)]
pub enum DetectorTell {
    /// One aggregated trade for the current base bucket
    ProcessTrade(Trade),
    /// One kline update for the current base interval
    ProcessBaseUpdate(BaseUpdate),
}

/// Detector Actor messages for asking (request-response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectorAsk {
    GetStatus,
}

/// Detector Actor responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectorReply {
    Status {
        symbol: String,
        state: SignalState,
        trades_processed: u64,
        buckets_closed: u64,
        signals_emitted: u64,
        high_pool: usize,
        low_pool: usize,
        rolling_samples: usize,
        rolling_ready: bool,
    },
}

/// Serializes the trade and kline streams of one symbol into the engine
pub struct DetectorActor {
    symbol: String,
    config: DetectorConfig,
    engine: AbsorptionEngine,
    /// Downstream consumer of engine events (notification, tests)
    event_sender: Option<mpsc::UnboundedSender<EngineEvent>>,
    trades_processed: u64,
    buckets_closed: u64,
    signals_emitted: u64,
}

impl DetectorActor {
    pub fn new(symbol: String, config: DetectorConfig) -> Self {
        Self {
            symbol,
            engine: AbsorptionEngine::new(&config),
            config,
            event_sender: None,
            trades_processed: 0,
            buckets_closed: 0,
            signals_emitted: 0,
        }
    }

    /// Forward every engine event to `sender`
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    fn publish(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            match &event {
                EngineEvent::BaseBucketClosed(bucket) => {
                    self.buckets_closed += 1;
                    debug!("🕐 [{}] Base bucket closed at {}", self.symbol, bucket.open_time_utc());
                }
                EngineEvent::CoarseBucketClosed(coarse) => {
                    debug!("🕐 [{}] Coarse bucket {} closed ({} members)", self.symbol, coarse.window_id, coarse.count);
                }
                EngineEvent::SignalConfirmed(signal) => {
                    self.signals_emitted += 1;
                    info!("🚨 [{}] {}", self.symbol, signal);
                }
                _ => {}
            }

            if let Some(sender) = &self.event_sender {
                if sender.send(event).is_err() {
                    warn!("Event receiver dropped, no longer forwarding detector events");
                    self.event_sender = None;
                }
            }
        }
    }

    fn status(&self) -> DetectorReply {
        DetectorReply::Status {
            symbol: self.symbol.clone(),
            state: self.engine.state(),
            trades_processed: self.trades_processed,
            buckets_closed: self.buckets_closed,
            signals_emitted: self.signals_emitted,
            high_pool: self.engine.pivots().pool(PivotSide::High).len(),
            low_pool: self.engine.pivots().pool(PivotSide::Low).len(),
            rolling_samples: self.engine.rolling_window().len(),
            rolling_ready: self.engine.rolling_window().is_ready(),
        }
    }
}

impl Actor for DetectorActor {
    type Mailbox = UnboundedMailbox<Self>;

    fn name() -> &'static str {
        "DetectorActor"
    }

    async fn on_start(&mut self, _actor_ref: ActorRef<Self>) -> Result<(), BoxError> {
        info!(
            symbol = %self.symbol,
            cluster_size = self.config.price_cluster_size,
            coarse_window_secs = self.config.coarse_window_secs,
            pivot_lookback = self.config.pivot_lookback,
            pool_size = self.config.pivot_pool_max_size,
            rolling_window = self.config.rolling_window_size,
            "🚀 Starting Detector Actor"
        );
        Ok(())
    }

    async fn on_stop(&mut self, _actor_ref: WeakActorRef<Self>, reason: ActorStopReason) -> Result<(), BoxError> {
        info!("🛑 Stopping Detector Actor: {:?}", reason);
        info!(
            symbol = %self.symbol,
            trades = self.trades_processed,
            buckets = self.buckets_closed,
            signals = self.signals_emitted,
            "📊 Final Detector Actor statistics"
        );
        Ok(())
    }
}

impl Message<DetectorTell> for DetectorActor {
    type Reply = ();

    async fn handle(&mut self, msg: DetectorTell, _ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            DetectorTell::ProcessTrade(trade) => {
                self.engine.on_trade(&trade);
                self.trades_processed += 1;
            }
            DetectorTell::ProcessBaseUpdate(update) => {
                let events = self.engine.on_base_update(&update);
                self.publish(events);
            }
        }
    }
}

impl Message<DetectorAsk> for DetectorActor {
    type Reply = Result<DetectorReply, String>;

    async fn handle(&mut self, msg: DetectorAsk, _ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            DetectorAsk::GetStatus => Ok(self.status()),
        }
    }
}
