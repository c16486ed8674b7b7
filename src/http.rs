pub mod client;
pub mod headers;

pub use client::{HttpClient, RequestOptions, header_map};
pub use headers::HeaderCodec;
