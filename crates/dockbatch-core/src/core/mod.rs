//! # Core Module
//!
//! Stateless building blocks of a docking batch: the data model and the file
//! formats. Nothing in here spawns processes or threads.
//!
//! ## Architecture
//!
//! - **Data Model** ([`models`]) - Run configurations, scored poses and per-ligand outcomes
//! - **File I/O** ([`io`]) - Engine output parsing, pose splitting, reports and the run ledger
//! - **Utilities** ([`utils`]) - Path resolution shared by the configuration layer

pub mod io;
pub mod models;
pub mod utils;
