pub mod pivots;
pub mod rolling_window;
pub mod structs;

// Re-export commonly used types for convenience
pub use pivots::PivotTracker;
pub use rolling_window::RollingWindow;
pub use structs::{Pivot, PivotPool, PivotSide, SweepResult};
