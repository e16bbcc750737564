//! The conversation orchestration engine.
//!
//! Decides, for every inbound user message, which personas respond, where the
//! conversation sits in its lifecycle, how disagreement between personas is
//! resolved, and how a failing upstream provider is contained.

pub mod conflict;
pub mod context;
pub mod events;
pub mod health;
pub mod orchestrator;
pub mod persona;
pub mod phase;
pub mod provider;
pub mod suggestions;
pub mod triggers;
pub mod types;
