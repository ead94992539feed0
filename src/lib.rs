pub mod error;
pub mod feed;
pub mod fetch;
pub mod gyms;
pub mod infra;
pub mod matching;
pub mod output;
pub mod ranklist;
pub mod rating;
pub mod registry;
pub mod retry;
pub mod services;
