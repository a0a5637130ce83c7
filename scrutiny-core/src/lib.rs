//! # scrutiny-core
//!
//! Foundation crate for the Scrutiny analysis engine.
//! Defines shared types, errors, config, events, and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing_init;
pub mod types;

pub use config::AnalysisConfig;
pub use errors::error_code::ErrorCode;
pub use events::dispatcher::EventDispatcher;
pub use events::handler::{AnalysisEventHandler, NoOpEventHandler};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::{DetectorId, FileId, RuleId, ViolationId};
