//! Price source over plain HTTP JSON endpoints.

use super::{extract_price, PriceEndpoint, PriceError, PriceSource};
use crate::domain::Decimal;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Fetches prices from one configured endpoint per symbol.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: Client,
    endpoints: HashMap<String, PriceEndpoint>,
    max_retry_elapsed: Duration,
}

impl HttpPriceSource {
    pub fn new(
        endpoints: HashMap<String, PriceEndpoint>,
        request_timeout: Duration,
    ) -> Result<Self, PriceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PriceError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoints,
            max_retry_elapsed: request_timeout * 2,
        })
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.endpoints.contains_key(symbol)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, PriceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(PriceError::Network(e.to_string())))?;

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(PriceError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(PriceError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(PriceError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn usd_price(&self, symbol: &str) -> Result<Option<Decimal>, PriceError> {
        let Some(endpoint) = self.endpoints.get(symbol) else {
            return Ok(None);
        };
        debug!(symbol, url = %endpoint.url, "Fetching USD price");

        let body = self.get_json(&endpoint.url).await?;
        extract_price(&body, &endpoint.json_path).map(Some)
    }
}
