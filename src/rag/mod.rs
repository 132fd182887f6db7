//! Answers and summaries grounded in retrieved call snippets.
//!
//! Every reply ends with a deterministic sources block built from the hits, whether or not a
//! language model was available.

pub mod context;
mod response;

pub use context::{format_answer_with_sources, format_snippets, shorten};
pub use response::Copilot;
