/// Detector engine
///
/// `pipeline` composes the aggregation, profile, baseline, pivot and signal
/// components into one deterministic pipeline; `actor` puts that pipeline
/// behind a kameo mailbox so both market streams are processed in order.
pub mod actor;
pub mod pipeline;

pub use actor::{DetectorActor, DetectorAsk, DetectorReply, DetectorTell};
pub use pipeline::{AbsorptionEngine, EngineEvent};
