//! HTTP client for the external ML processing endpoints.
//!
//! Each [`DelegateKind`] maps to one configured URL. A call POSTs the
//! operation's fields (form body, or query string for background change) and
//! hands back the response body as a stream; nothing is buffered beyond the
//! first chunk, which is peeked to reject empty results.

use clipstudio_core::delegate::{DelegateKind, DelegateRequest, Transport};
use futures::{stream, StreamExt};

use crate::ByteStream;

/// Errors from an ML delegate call. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    /// The HTTP request itself failed (network, DNS, TLS, broken body).
    #[error("{kind} request failed: {source}")]
    Request {
        kind: DelegateKind,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint returned a non-2xx status code.
    #[error("{kind} endpoint returned {status}: {body}")]
    Status {
        kind: DelegateKind,
        status: u16,
        body: String,
    },

    /// The endpoint answered 2xx with no content.
    #[error("{kind} endpoint returned an empty body")]
    EmptyBody { kind: DelegateKind },
}

impl DelegateError {
    /// Upstream HTTP status, when the endpoint answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            DelegateError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One URL per delegated operation.
#[derive(Debug, Clone)]
pub struct DelegateEndpoints {
    pub auto_removal: String,
    pub click_removal: String,
    pub denoise: String,
    pub stylize: String,
    pub superres: String,
    pub bgchange: String,
    pub gif_generation: String,
}

impl DelegateEndpoints {
    /// Every operation served from one host under its conventional path.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auto_removal: format!("{base}/process"),
            click_removal: format!("{base}/remove"),
            denoise: format!("{base}/denoise"),
            stylize: format!("{base}/stylize"),
            superres: format!("{base}/run"),
            bgchange: format!("{base}/bgchange"),
            gif_generation: format!("{base}/generate"),
        }
    }

    pub fn url(&self, kind: DelegateKind) -> &str {
        match kind {
            DelegateKind::AutoRemoval => &self.auto_removal,
            DelegateKind::ClickRemoval => &self.click_removal,
            DelegateKind::Denoise => &self.denoise,
            DelegateKind::Stylize => &self.stylize,
            DelegateKind::SuperResolution => &self.superres,
            DelegateKind::BackgroundChange => &self.bgchange,
            DelegateKind::GifGeneration => &self.gif_generation,
        }
    }
}

pub struct DelegateClient {
    client: reqwest::Client,
    endpoints: DelegateEndpoints,
}

impl DelegateClient {
    pub fn new(endpoints: DelegateEndpoints) -> Self {
        Self::with_client(reqwest::Client::new(), endpoints)
    }

    pub fn with_client(client: reqwest::Client, endpoints: DelegateEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// POST `request` to its endpoint and return the result body as a stream.
    pub async fn call(&self, request: &DelegateRequest) -> Result<ByteStream, DelegateError> {
        let kind = request.kind();
        let url = self.endpoints.url(kind);
        let fields = request.fields();

        tracing::info!(%kind, %url, "Calling ML delegate");

        let builder = self.client.post(url);
        let builder = match kind.transport() {
            Transport::Form => builder.form(&fields),
            Transport::Query => builder.query(&fields),
        };
        let response = builder
            .send()
            .await
            .map_err(|source| DelegateError::Request { kind, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(%kind, status = status.as_u16(), "ML delegate failed");
            return Err(DelegateError::Status {
                kind,
                status: status.as_u16(),
                body,
            });
        }
        if response.content_length() == Some(0) {
            return Err(DelegateError::EmptyBody { kind });
        }

        let mut body = response.bytes_stream();
        let first = loop {
            match body.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
                Some(Err(source)) => return Err(DelegateError::Request { kind, source }),
                None => return Err(DelegateError::EmptyBody { kind }),
            }
        };

        let rest = body.map(|item| item.map_err(std::io::Error::other));
        Ok(Box::pin(stream::once(async move { Ok::<_, std::io::Error>(first) }).chain(rest)))
    }
}
