//! Traits and records for the external systems this crate talks to.

pub mod judge_api;
pub mod sheet_api;
