//! HTTP-backed [`ServiceInvoker`].
//!
//! Makes exactly one request per stage through the platform
//! [`HttpClient`]. Whatever status the service answers with is handed
//! back as a [`StageResult`]; only transport failures become errors.

use std::sync::Arc;

use async_trait::async_trait;

use apix_platform::http::{HttpClient, HttpError};
use apix_types::extension::ServiceDescriptor;
use apix_types::request::StageResult;

use super::traits::{InvokeError, ServiceInvoker};

/// Calls extension services over HTTP.
pub struct HttpServiceInvoker {
    http: Arc<dyn HttpClient>,
}

impl HttpServiceInvoker {
    /// Create an invoker over the given HTTP client.
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

impl From<HttpError> for InvokeError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::InvalidMethod(m) => InvokeError::InvalidRequest(format!("method {m}")),
            HttpError::Transport(e) if e.is_builder() => InvokeError::InvalidRequest(e.to_string()),
            HttpError::Transport(e) => InvokeError::Transport(e.to_string()),
        }
    }
}

#[async_trait]
impl ServiceInvoker for HttpServiceInvoker {
    async fn invoke(
        &self,
        service: &ServiceDescriptor,
        payload: &[u8],
    ) -> Result<StageResult, InvokeError> {
        let body = service.method.carries_body().then_some(payload);

        let response = self
            .http
            .request(service.method.as_str(), &service.uri, &service.headers, body)
            .await?;

        tracing::debug!(
            uri = %service.uri,
            status = response.status,
            body_bytes = response.body.len(),
            "extension service responded"
        );
        Ok(StageResult::new(response.status, response.body))
    }
}
