//! Configuration types for lesson plan generation and the HTTP server.
//!
//! Generation behaviour is controlled through [`GenerationConfig`], built via
//! its [`GenerationConfigBuilder`]. Server concerns (bind address, upload
//! staging, body limits) live separately in [`ServerConfig`] so the retry
//! loop can be constructed and tested without any transport in sight.
//!
//! Both are loaded once at process start and never mutated afterwards.

use crate::error::PlannerError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default model requested from the provider.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Configuration for the retry orchestrator and generation client.
///
/// # Example
/// ```rust
/// use lesson_planner::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .max_attempts(3)
///     .temperature(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider model identifier. Default: `gemini-1.5-pro`.
    pub model: String,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Total generation attempts, including the first. Default: 5.
    pub max_attempts: u32,

    /// Exponential backoff base in milliseconds. Default: 5000.
    ///
    /// The wait after failed attempt `n` is `retry_backoff_ms * 2^n`:
    /// 10 s, 20 s, 40 s, 80 s.
    pub retry_backoff_ms: u64,

    /// Safety margin added to a server-suggested delay. Default: 2000.
    pub retry_delay_buffer_ms: u64,

    /// Upper bound for the wait that precedes the final attempt. Default: 30000.
    pub final_retry_cap_ms: u64,

    /// Per-call timeout in milliseconds. Default: 60000.
    pub api_timeout_ms: u64,

    /// Serve the template plan when generation fails. Default: true.
    ///
    /// When disabled, exhaustion and non-retryable failures are returned as
    /// [`PlannerError::GenerationFailed`].
    pub fallback_enabled: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            max_attempts: 5,
            retry_backoff_ms: 5_000,
            retry_delay_buffer_ms: 2_000,
            final_retry_cap_ms: 30_000,
            api_timeout_ms: 60_000,
            fallback_enabled: true,
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn retry_delay_buffer_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_buffer_ms = ms;
        self
    }

    pub fn final_retry_cap_ms(mut self, ms: u64) -> Self {
        self.config.final_retry_cap_ms = ms;
        self
    }

    pub fn api_timeout_ms(mut self, ms: u64) -> Self {
        self.config.api_timeout_ms = ms;
        self
    }

    pub fn fallback_enabled(mut self, v: bool) -> Self {
        self.config.fallback_enabled = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, PlannerError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(PlannerError::InvalidConfig("Model must not be empty".into()));
        }
        if c.max_attempts == 0 {
            return Err(PlannerError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_ms == 0 {
            return Err(PlannerError::InvalidConfig(
                "api_timeout_ms must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 5000.
    pub port: u16,

    /// Directory where uploads are staged during extraction. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Largest accepted request body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parse `host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, PlannerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                PlannerError::InvalidConfig(format!(
                    "Invalid bind address '{}:{}': {e}",
                    self.host, self.port
                ))
            })
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, PlannerError> {
        if self.config.max_upload_bytes == 0 {
            return Err(PlannerError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        self.config.socket_addr()?;
        Ok(self.config)
    }
}
