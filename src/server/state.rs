use std::sync::Arc;

use super::signature::SigningKey;
use crate::{Result, config::Config, epg::XmltvWriter, resolve::StreamResolver};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: StreamResolver,
    pub xmltv: Arc<XmltvWriter>,
    pub signing_key: SigningKey,
    /// Body limit for `POST /xmltv`.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, signing_key: SigningKey) -> Result<Self> {
        Ok(Self {
            resolver: StreamResolver::new(config.resolver.clone())?,
            xmltv: Arc::new(XmltvWriter::new(config.xmltv.clone())),
            signing_key,
            max_body_bytes: config.max_body_bytes,
        })
    }
}
