use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::quote::{LastQuote, Quote};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("deadline exceeded")]
    Timeout,
    #[error("could not send request: {0}")]
    Transport(reqwest::Error),
    #[error("upstream returned {0}")]
    Status(StatusCode),
    #[error("could not decode body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            QueryError::Timeout
        } else {
            QueryError::Transport(e)
        }
    }
}

/// Somewhere a USD/BRL quote can be fetched from.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self) -> Result<Quote, QueryError>;
}

pub struct HttpQuoteSource {
    client: Client,
    url: String,
}

impl HttpQuoteSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self) -> Result<Quote, QueryError> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(QueryError::Status(resp.status()));
        }

        let body = resp.bytes().await?;
        let last: LastQuote = serde_json::from_slice(&body)?;

        Ok(last.usdbrl)
    }
}

/// Fetches a quote, giving up after `deadline`. The pending fetch is dropped
/// on timeout, which aborts the underlying request.
pub async fn query_exchange_rate(
    source: &dyn QuoteSource,
    deadline: Duration,
) -> Result<Quote, QueryError> {
    match tokio::time::timeout(deadline, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout),
    }
}
