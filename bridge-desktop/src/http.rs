//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Reqwest-based HTTP client
///
/// Connection pooling and TLS come from reqwest; retry with exponential
/// backoff is layered here. Non-success statuses are returned as responses,
/// not errors; callers classify them.
#[derive(Debug)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with the default 30-second request timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom default request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("chartdl-core/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(Self::convert_method(request.method), &request.url);

        for (key, value) in request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder
    }

    async fn execute_inner(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < policy.max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            match self.build_request(request.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    // 5xx and 429 are worth another attempt; everything else
                    // is handed back to the caller as-is.
                    if (status >= 500 || status == 429) && attempt + 1 < policy.max_attempts {
                        warn!(status, attempt = attempt + 1, "Retryable HTTP status");
                        last_error = Some(BridgeError::Http {
                            status,
                            body: String::new(),
                        });
                    } else {
                        let headers: HashMap<String, String> = response
                            .headers()
                            .iter()
                            .filter_map(|(k, v)| {
                                v.to_str().ok().map(|s| (k.to_string(), s.to_string()))
                            })
                            .collect();

                        let body = response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

                        return Ok(HttpResponse {
                            status,
                            headers,
                            body,
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "HTTP request failed");
                    last_error = Some(if e.is_timeout() {
                        BridgeError::OperationFailed("Request timed out".to_string())
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            attempt += 1;

            if attempt < policy.max_attempts {
                let delay = if policy.use_exponential_backoff {
                    (policy.base_delay * 2u32.pow(attempt - 1)).min(policy.max_delay)
                } else {
                    policy.base_delay
                };
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_inner(request, RetryPolicy::default()).await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_inner(request, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_constructs() {
        let _client = ReqwestHttpClient::new();
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
    }
}
