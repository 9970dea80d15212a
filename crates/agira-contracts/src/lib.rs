//! # agira-contracts
//!
//! Shared types, error taxonomy, and configuration schema for the Agira
//! reporting core.
//!
//! All crates in the workspace import from here. No rendering, storage, or
//! cache logic lives in this crate.

pub mod cache;
pub mod config;
pub mod error;
pub mod report;
