//! Deployment scenarios, one file per behaviour

mod coverage_threshold;
mod failure_handling;
mod rerun;
mod success_chain;
