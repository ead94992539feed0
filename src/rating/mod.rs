//! Per-contest ratings and their best-of-K aggregation.

pub mod aggregate;
pub mod contest;
pub mod utility;

pub use aggregate::{AggregateRating, Aggregation, RatingBook, aggregate};
pub use contest::{ContestRating, ContestScale, rate_contest, registered_rows};
