pub mod resolve;
pub mod xmltv;

pub use resolve::handle_resolve;
pub use xmltv::handle_xmltv;
