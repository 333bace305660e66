//! Deployment execution engine

pub mod engine;
pub mod error;
pub mod executor;

pub use engine::{DeployEngine, EventHandler, ExecutionEvent};
pub use error::DeployError;
pub use executor::{StageExecutor, StageOutcome};
