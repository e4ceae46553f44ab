//! CLI command implementations

pub mod models;
pub mod predict;
