//! Request signing for the judge API.

mod api_sig;

pub use api_sig::{ApiSig, sign};
