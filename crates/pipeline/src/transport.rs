//! The seam between the pipeline and whatever carries bytes to the service.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, PipelineError, PipelineResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request relative to the service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the base URL, without a leading slash.
    pub path: String,
    pub body: Option<Bytes>,
    pub content_type: Option<&'static str>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: &'static str) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type);
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn with_json<T: serde::Serialize + ?Sized>(self, value: &T) -> PipelineResult<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|err| PipelineError::Encode(vector::VectorError::from(err)))?;
        Ok(self.with_body(body, JSON_CONTENT_TYPE))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Passes a 200 response through and classifies anything else.
    pub fn check(self) -> PipelineResult<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ApiError::from_response(self.status, &self.body).into())
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the service.
///
/// Implementations own authentication, connection reuse, and timeouts. They
/// should return [`PipelineError::Cancelled`] promptly once `cancel` fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<TransportResponse>;
}
