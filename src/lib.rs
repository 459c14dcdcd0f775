pub mod aggregation;
pub mod config;
pub mod engine;
pub mod logging;
pub mod signal;
pub mod technical_analysis;
pub mod volume_profile;
pub mod websocket;
