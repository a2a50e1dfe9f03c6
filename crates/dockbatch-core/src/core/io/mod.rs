//! Reading and writing the files a docking batch touches.
//!
//! The docking engine is only ever seen through its text: the result table on
//! standard output ([`vina`]) and the multi-model PDBQT it writes ([`pdbqt`]).
//! Batch outputs are the per-receptor reports ([`reports`]) and the append-only
//! run ledger ([`history`]).

pub mod history;
pub mod pdbqt;
pub mod reports;
pub mod vina;
