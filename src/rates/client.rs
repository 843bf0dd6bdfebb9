//! External rate service client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use super::RateError;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of currency conversions and the supported-currency set.
///
/// The production implementation is [`HttpRateClient`]; tests substitute
/// scripted sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Convert `amount` from one currency to another. A single request,
    /// no retry accounting; classification of failures is the caller's
    /// job via [`RateError::retry_class`].
    async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, RateError>;

    /// Map of supported currency codes to display names.
    async fn supported_currencies(&self) -> Result<HashMap<String, String>, RateError>;
}

/// HTTP client for the external currency conversion service.
#[derive(Debug, Clone)]
pub struct HttpRateClient {
    client: Client,
    base_url: String,
}

impl HttpRateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn classify(status: StatusCode) -> RateError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            RateError::RateLimited
        } else if status.is_server_error() {
            RateError::Server {
                status: status.as_u16(),
            }
        } else {
            RateError::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

#[async_trait]
impl RateSource for HttpRateClient {
    async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, RateError> {
        let url = format!("{}/api/currency/convert", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("amount", amount.to_string().as_str()),
                ("from", from),
                ("to", to),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status));
        }

        response
            .json::<Decimal>()
            .await
            .map_err(|e| RateError::InvalidResponse(e.to_string()))
    }

    async fn supported_currencies(&self) -> Result<HashMap<String, String>, RateError> {
        let url = format!("{}/api/currency/supported", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status));
        }

        response
            .json::<HashMap<String, String>>()
            .await
            .map_err(|e| RateError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        assert!(matches!(
            HttpRateClient::classify(StatusCode::TOO_MANY_REQUESTS),
            RateError::RateLimited
        ));
    }

    #[test]
    fn test_classify_server_error() {
        assert!(matches!(
            HttpRateClient::classify(StatusCode::BAD_GATEWAY),
            RateError::Server { status: 502 }
        ));
    }

    #[test]
    fn test_classify_client_error_is_rejection() {
        assert!(matches!(
            HttpRateClient::classify(StatusCode::NOT_FOUND),
            RateError::Rejected { status: 404 }
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpRateClient::new("http://rates.local/");
        assert_eq!(client.base_url, "http://rates.local");
    }
}
