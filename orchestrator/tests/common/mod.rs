//! Common test utilities and infrastructure
//!
//! Shared fixtures, fakes and the harness used by every orchestrator test
//! suite.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{Event, EventLog, LoggingSleeper, OrchestratorBuilder, RecordingPersistence, ScriptedRenderer, TestHarness};
