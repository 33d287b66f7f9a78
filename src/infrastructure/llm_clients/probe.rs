use super::{classify_transport_error, endpoint_url, ConnectivityProbe, ProbeErrorKind, ProbeResult};
use crate::domain::error::TranslationError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const TAGS_PATH: &str = "/api/tags";

/// Reachability check against the model server's tag listing.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProber {
    async fn probe(&self, host: &str, port: u16) -> ProbeResult {
        let url = match endpoint_url(host, port, TAGS_PATH) {
            Ok(url) => url,
            Err(_) => return ProbeResult::unreachable(None, ProbeErrorKind::HostNotFound),
        };

        let result = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => {
                ProbeResult::reachable(response.status().as_u16())
            }
            Ok(response) => {
                ProbeResult::unreachable(Some(response.status().as_u16()), ProbeErrorKind::Other)
            }
            Err(err) => {
                let kind = match classify_transport_error(&err) {
                    TranslationError::ConnectionRefused => ProbeErrorKind::Refused,
                    TranslationError::Timeout => ProbeErrorKind::Timeout,
                    TranslationError::HostNotFound => ProbeErrorKind::HostNotFound,
                    _ => ProbeErrorKind::Other,
                };
                ProbeResult::unreachable(None, kind)
            }
        };

        debug!(host, port, reachable = result.reachable, "Probed model endpoint");
        result
    }
}
