use pipeline::{MalformedPolicy, PipelineSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ClientResult;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Service root; request paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent verbatim as the `Authorization` header
    #[serde(default)]
    pub token: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Idle keep-alive connections per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Caps worker count below the CPU count
    #[serde(default)]
    pub max_workers: Option<usize>,

    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            max_workers: None,
            malformed_policy: MalformedPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from an optional `endee.{toml,yaml,json}` file and
    /// `ENDEE__*` environment variables
    pub fn load() -> ClientResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("endee").required(false))
            .add_source(config::Environment::with_prefix("ENDEE").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> ClientResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml));

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Pipeline policy for index handles created by this client
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let mut settings = PipelineSettings::default().with_malformed_policy(self.malformed_policy);
        if let Some(max) = self.max_workers {
            let parallelism = settings.parallelism.min(max);
            settings = settings.with_parallelism(parallelism);
        }
        settings
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    32
}
