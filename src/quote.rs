use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

/// Body of `GET /json/last/USD-BRL`.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct LastQuote {
    #[serde(rename = "USDBRL")]
    pub usdbrl: Quote,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BidResponse {
    pub bid: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
