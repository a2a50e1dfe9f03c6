//! # dockbatch
//!
//! Batch orchestration of AutoDock Vina docking runs.
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`RunConfig`, `PoseRecord`,
//!   `ReceptorRun`) and file I/O: the engine output parser, the multi-model PDBQT
//!   splitter, report writers and the run history ledger.
//!
//! - **[`engine`]: The Logic Core.** Configuration normalization, environment
//!   validation, the `DockingEngine` subprocess boundary and the concurrent
//!   per-ligand scheduler with its failure isolation.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the layers
//!   below: running a docking batch and preparing input molecules.

pub mod core;
pub mod engine;
pub mod workflows;
