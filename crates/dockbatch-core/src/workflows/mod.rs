//! # Workflows Module
//!
//! Top-level entry points that tie the `engine` and `core` layers together.
//!
//! - **Docking Batch** ([`batch`]) - Normalize, validate, schedule, report and
//!   record a sequence of receptor configurations.
//! - **Molecule Preparation** ([`prepare`]) - Turn receptors and ligands in
//!   common formats into docking-ready PDBQT files.

pub mod batch;
pub mod prepare;
