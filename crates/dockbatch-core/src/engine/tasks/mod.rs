//! Units of work dispatched by the batch scheduler.
//!
//! A task owns everything about one ligand: its private output directory, the
//! engine invocation, and the interpretation of what the engine produced. Tasks
//! never return errors; every failure becomes a [`LigandOutcome::Failed`] value.
//!
//! [`LigandOutcome::Failed`]: crate::core::models::records::LigandOutcome::Failed

pub mod ligand;
