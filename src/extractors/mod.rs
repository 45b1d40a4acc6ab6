//! Request extractors.

mod headers;

pub use headers::RequestHeaders;
