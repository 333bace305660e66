//! Core domain models for a deployment
//!
//! This module defines the configuration, the fixed stage list and the
//! state that a deployment run moves through.

pub mod config;
pub mod pipeline;
pub mod step;
pub mod condition;
pub mod context;
pub mod state;

pub use pipeline::*;
pub use step::*;
pub use context::*;
pub use state::*;
