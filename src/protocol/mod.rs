//! Protocol-level building blocks: header-value grammars and well-known names.
//!
//! - [`header_words`] - structured `name=value; ...` header values
//! - [`etag`] - entity-tag lists
//! - [`constants`] - header names and status groups used by the user agent

pub mod constants;
pub mod etag;
pub mod header_words;

pub use etag::{join_etag_list, split_etag_list, ETag};
pub use header_words::{join_header_words, split_header_words, HeaderWord};
