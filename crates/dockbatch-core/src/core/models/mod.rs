//! # Core Models Module
//!
//! Plain data types shared by every stage of a docking batch.
//!
//! ## Key Components
//!
//! - [`config`] - Raw and normalized run configurations, docking box geometry and
//!   worker limits
//! - [`records`] - Scored poses, per-ligand outcomes and the aggregated results of a
//!   receptor's batch
//!
//! These types carry no behavior beyond small accessors; parsing lives in
//! [`crate::core::io`] and orchestration in [`crate::engine`].

pub mod config;
pub mod records;
