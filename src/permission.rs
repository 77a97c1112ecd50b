//! Permission-gated catalog acquisition.
//!
//! `GatePolicy` is the pure decision table; `PermissionFlow` applies it to
//! persisted state and turns user answers into the next UI step.

mod flow;
mod gate;

pub use flow::{FlowStep, PermissionFlow};
pub use gate::{GatePolicy, GateState, PermissionStatus};
