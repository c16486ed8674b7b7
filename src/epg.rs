pub mod model;
pub mod source;
pub mod xmltv;

pub use model::{EpgChannel, Programme, ProgrammeData};
pub use source::load_channels;
pub use xmltv::XmltvWriter;

use crate::{Result, http::HttpClient, resolve::StreamResolver};

/// Load EPG channels from `source`, resolve their stream URLs and render
/// the XMLTV document.
pub async fn grab(
    source: &str,
    client: &HttpClient,
    resolver: &StreamResolver,
    writer: &XmltvWriter,
) -> Result<String> {
    let mut channels = load_channels(source, client).await?;
    tracing::info!("Loaded {} channels from {}", channels.len(), source);

    resolver.resolve_channels(&mut channels).await;

    writer.write(&channels)
}
