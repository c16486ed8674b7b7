pub mod config;
pub mod epg;
pub mod error;
pub mod http;
pub mod m3u;
pub mod resolve;
pub mod server;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
