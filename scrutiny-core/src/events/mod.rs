//! Progress/lifecycle events emitted by the scanner and orchestrator.
//!
//! Ground: `drift_core::events` (`DriftEventHandler`, `EventDispatcher`),
//! reconstructed here from its usage in `drift_analysis::scanner::scanner`
//! (the pack's copy of the event module itself was filtered out, but its
//! shape is fully determined by that call site).

pub mod dispatcher;
pub mod handler;
pub mod types;
