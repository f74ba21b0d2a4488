use async_trait::async_trait;
use pipeline::{
    CancellationToken, Method, PipelineError, PipelineResult, Transport, TransportRequest,
    TransportResponse,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// [`Transport`] over a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins a base URL and a relative path with exactly one `/`.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<TransportResponse> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(to_reqwest(request.method), url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, token);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(TransportResponse::new(status, body))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = exchange => result.map_err(|err| PipelineError::Transport(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_uses_one_slash() {
        assert_eq!(join_url("http://h/api/v1", "index/list"), "http://h/api/v1/index/list");
        assert_eq!(join_url("http://h/api/v1/", "/index/list"), "http://h/api/v1/index/list");
        assert_eq!(join_url("http://h/api/v1//", "index/list"), "http://h/api/v1/index/list");
    }

    #[test]
    fn transport_uses_configured_base() {
        let transport = HttpTransport::new(&ClientConfig::default().with_base_url("http://x:1/api/v1/"))
            .unwrap();
        assert_eq!(transport.url("index/a/info"), "http://x:1/api/v1/index/a/info");
    }

    #[tokio::test]
    async fn cancelled_token_fails_fast() {
        // Nothing listens on this port; the cancel branch must win regardless.
        let transport =
            HttpTransport::new(&ClientConfig::default().with_base_url("http://127.0.0.1:9/api/v1"))
                .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = transport
            .send(TransportRequest::get("index/list"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
