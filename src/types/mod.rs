//! HTTP message types.
//!
//! - [`Headers`] - the ordered, case-insensitive header store
//! - [`Request`] - method, URI, headers and content handed to a transport
//! - [`Response`] - status, headers and content, linked to the request that
//!   produced it and to the response it superseded

pub mod headers;
pub mod request;
pub mod response;

pub use headers::{HeaderValues, Headers};
pub use request::Request;
pub use response::Response;
