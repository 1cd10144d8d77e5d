use thiserror::Error;
use uuid::Uuid;

use crate::quote::Quote;

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    pub var_bid: String,
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidExchangeRate {
    #[error("id is invalid")]
    Id,
    #[error("{0} is required")]
    Missing(&'static str),
}

impl ExchangeRate {
    /// Builds a record from an upstream quote under a freshly generated id.
    pub fn new(quote: Quote) -> Result<Self, InvalidExchangeRate> {
        let rate = Self {
            id: Uuid::new_v4(),
            code: quote.code,
            codein: quote.codein,
            name: quote.name,
            high: quote.high,
            low: quote.low,
            var_bid: quote.var_bid,
            pct_change: quote.pct_change,
            bid: quote.bid,
            ask: quote.ask,
            timestamp: quote.timestamp,
            create_date: quote.create_date,
        };
        rate.validate()?;

        Ok(rate)
    }

    pub fn validate(&self) -> Result<(), InvalidExchangeRate> {
        if self.id.is_nil() {
            return Err(InvalidExchangeRate::Id);
        }

        let fields = [
            ("code", &self.code),
            ("codein", &self.codein),
            ("name", &self.name),
            ("high", &self.high),
            ("low", &self.low),
            ("varBid", &self.var_bid),
            ("pctChange", &self.pct_change),
            ("bid", &self.bid),
            ("ask", &self.ask),
            ("timestamp", &self.timestamp),
            ("create_date", &self.create_date),
        ];

        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(InvalidExchangeRate::Missing(*field)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_quote() -> Quote {
    Quote {
        code: "USD".into(),
        codein: "BRL".into(),
        name: "Dollar".into(),
        high: "10.00".into(),
        low: "5.00".into(),
        var_bid: "0.50".into(),
        pct_change: "0.50".into(),
        bid: "10.00".into(),
        ask: "10.00".into(),
        timestamp: "2022-01-01 00:00:00".into(),
        create_date: "2022-01-01 00:00:00".into(),
    }
}
