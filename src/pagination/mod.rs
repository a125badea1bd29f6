//! Pagination module
//!
//! A forward-only lazy page sequence over the REST client, driven by
//! the `next_cursor` / `has_more` fields embedded in each response.
//! Finite when the stream exhausts naturally or a caller-supplied page
//! cap is reached; the two endings stay distinguishable.

mod pager;
mod types;

pub use pager::Pager;
pub use types::{PageCursor, Termination};
