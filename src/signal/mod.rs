/// Absorption signal lifecycle
///
/// Combines the bucket profile, the rolling baseline and the pivot pools into
/// candidate, confirmation and cancellation decisions.
pub mod state_machine;
pub mod structs;

pub use state_machine::SignalStateMachine;
pub use structs::{
    AbsorptionSignal, CancelReason, ConfirmationOutcome, PendingCandidate, SignalConfig,
    SignalDirection, SignalState,
};
