//! # Engine Module
//!
//! The docking orchestration core: everything between a raw run configuration
//! and a receptor's aggregated ligand outcomes.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`], [`normalize`]) - Process-wide settings and the
//!   normalization of raw run configurations into typed [`RunConfig`]s
//! - **Validation** ([`validate`]) - Precondition checks run before any docking starts
//! - **Engine Boundary** ([`runner`]) - The [`DockingEngine`] trait and its AutoDock Vina
//!   subprocess implementation
//! - **Scheduling** ([`scheduler`]) - Concurrent per-ligand dispatch on a bounded pool
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error types
//!
//! Failures of a single ligand never surface as errors here; they are values
//! carried by [`LigandOutcome`](crate::core::models::records::LigandOutcome).
//!
//! [`RunConfig`]: crate::core::models::config::RunConfig
//! [`DockingEngine`]: runner::DockingEngine

pub mod config;
pub mod error;
pub mod normalize;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub(crate) mod tasks;
pub mod validate;
