//! reqwest-backed transport

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::retry::{RetryConfig, RetryPolicy};
use super::{Transport, TransportResponse, parse_service_error_message};
use crate::api::context::RequestContext;
use crate::api::error::TableError;
use crate::api::models::LocationMode;

/// Transport over a pooled reqwest client with retry and primary/secondary
/// endpoint selection.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    primary_uri: String,
    secondary_uri: Option<String>,
    http_client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl ReqwestTransport {
    pub fn new(primary_uri: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tablestore-client/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            primary_uri: primary_uri.into(),
            secondary_uri: None,
            http_client,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_secondary(mut self, secondary_uri: impl Into<String>) -> Self {
        self.secondary_uri = Some(secondary_uri.into());
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_policy = RetryPolicy::new(config);
        self
    }

    /// Create a transport reusing an externally configured reqwest client.
    pub fn with_custom_client(
        primary_uri: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            primary_uri: primary_uri.into(),
            secondary_uri: None,
            http_client,
            retry_policy: RetryPolicy::default(),
        }
    }

    async fn try_endpoint(
        &self,
        base_uri: &str,
        context: &RequestContext,
    ) -> anyhow::Result<TransportResponse> {
        let method = reqwest::Method::from_bytes(context.method.as_bytes())
            .map_err(|_| anyhow::anyhow!("invalid HTTP method '{}'", context.method))?;
        let url = format!("{}/{}", base_uri.trim_end_matches('/'), context.path);
        debug!("{} {}", context.method, url);

        let response = self
            .retry_policy
            .execute(|| {
                let mut request = self.http_client.request(method.clone(), url.as_str());
                if !context.query_params.is_empty() {
                    request = request.query(&context.query_params);
                }
                for (name, value) in &context.headers {
                    request = request.header(name, value);
                }
                if !context.body.is_empty() {
                    request = request.body(context.body.clone());
                }
                request.send()
            })
            .await?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.to_string(), value_str.to_string());
            }
        }
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send_context(&self, context: &RequestContext) -> anyhow::Result<TransportResponse> {
        let response = match context.location_mode {
            LocationMode::SecondaryOnly => {
                let secondary = self.secondary_uri.as_deref().ok_or_else(|| {
                    TableError::validation("no secondary endpoint is configured")
                })?;
                self.try_endpoint(secondary, context).await?
            }
            LocationMode::PrimaryOnly => self.try_endpoint(&self.primary_uri, context).await?,
            LocationMode::PrimaryThenSecondary => {
                match self.try_endpoint(&self.primary_uri, context).await {
                    Ok(response) => response,
                    Err(primary_err) => match self.secondary_uri.as_deref() {
                        Some(secondary) => {
                            debug!("primary endpoint failed, falling back to secondary");
                            self.try_endpoint(secondary, context).await?
                        }
                        None => return Err(primary_err),
                    },
                }
            }
        };

        if !context.expects_status(response.status) {
            let message = parse_service_error_message(&response.body_text())
                .unwrap_or_else(|| response.body_text());
            return Err(TableError::Protocol {
                status: response.status,
                message,
            }
            .into());
        }

        Ok(response)
    }
}
