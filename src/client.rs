use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use log::info;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::{config::ClientConfig, quote::BidResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client: timeout exceeded")]
    Timeout,
    #[error("could not send request: {0}")]
    Transport(reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e)
        }
    }
}

/// Asks the server for the current bid, failing after `deadline`.
pub async fn fetch_quote(
    client: &Client,
    url: &str,
    deadline: Duration,
) -> Result<BidResponse, ClientError> {
    let request = async {
        let resp = client.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok::<BidResponse, ClientError>(serde_json::from_slice(&body)?)
    };

    match tokio::time::timeout(deadline, request).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout),
    }
}

pub fn quote_line(bid: &str) -> String {
    format!(" Dólar: {{{}}}\n", bid)
}

pub async fn save_to_file(path: impl AsRef<Path>, quote: &BidResponse) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, quote_line(&quote.bid))
        .await
        .with_context(|| format!("could not write to {}", path.display()))
}

async fn log_quote(quote: &BidResponse) {
    info!(
        "recebido: {}",
        serde_json::to_string(quote).unwrap_or_else(|_| quote.bid.clone())
    );
}

/// Fetches one quote and stores it. Nothing is written unless the fetch
/// succeeds.
pub async fn run(config: &ClientConfig) -> Result<BidResponse> {
    let quote = fetch_quote(&Client::new(), &config.server_url, config.timeout)
        .await
        .context("could not get exchange rate")?;

    let ((), saved) = tokio::join!(log_quote(&quote), save_to_file(&config.output_file, &quote));
    saved.context("could not save to file")?;

    Ok(quote)
}
