//! Concrete clients for the judge API and the registration sheet.

pub mod codeforces;
pub mod keys;
pub mod sheets;
