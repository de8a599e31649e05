//! kf-cli: Command-line interface for kube-forge
//!
//! Provides the `kube-forge` CLI, a thin client for the orchestrator's
//! HTTP API.

pub mod client;
pub mod commands;
pub mod output;
