//! Codeforces-style judge API client.

mod cache;
mod client;
mod resolver;

pub use client::{CodeforcesClient, DEFAULT_BASE_URL, parse_envelope};
pub use resolver::JudgeHandleResolver;
