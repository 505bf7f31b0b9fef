//! Outbound request types

mod api_request;
mod header;
mod method;

pub use api_request::{AUTHORIZATION, ApiRequest};
pub use header::{Header, Headers};
pub use method::HttpMethod;
