use actix_web::{HttpResponse, get, http::StatusCode, web};
use log::{error, info, warn};

use crate::{
    config::Deadlines,
    exchange_rate::ExchangeRate,
    quote::{BidResponse, Message},
    recorder::Recorder,
    upstream::{QueryError, QuoteSource, query_exchange_rate},
};

pub const MSG_QUERY_TIMEOUT: &str = "query exchange rate: timeout exceeded";
pub const MSG_CLIENT_TIMEOUT: &str = "client: timeout exceeded";
pub const MSG_INTERNAL_ERROR: &str = "error while querying exchange rate";

/// `GET /cotacao`: answers with the current USD/BRL bid and queues the full
/// quote for persistence.
///
/// The upstream query runs under its own deadline, and the whole request
/// under the inbound budget; whichever is exceeded first yields a 504. If the
/// caller disconnects, actix drops this future and the upstream request with
/// it.
#[get("/cotacao")]
pub async fn get_exchange_rate(
    source: web::Data<dyn QuoteSource>,
    recorder: web::Data<Recorder>,
    deadlines: web::Data<Deadlines>,
) -> HttpResponse {
    let query = query_exchange_rate(source.get_ref(), deadlines.upstream);

    let result = tokio::select! {
        result = query => result,
        _ = tokio::time::sleep(deadlines.request) => {
            warn!("{}", MSG_CLIENT_TIMEOUT);
            return message(StatusCode::GATEWAY_TIMEOUT, MSG_CLIENT_TIMEOUT);
        }
    };

    let quote = match result {
        Ok(quote) => quote,
        Err(QueryError::Timeout) => {
            warn!("{}", MSG_QUERY_TIMEOUT);
            return message(StatusCode::GATEWAY_TIMEOUT, MSG_QUERY_TIMEOUT);
        }
        Err(e) => {
            error!("{}: {}", MSG_INTERNAL_ERROR, e);
            return message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", MSG_INTERNAL_ERROR, e),
            );
        }
    };

    let response = BidResponse {
        bid: quote.bid.clone(),
    };

    info!("received: {}", to_json(&quote));
    info!("sent: {}", to_json(&response));

    match ExchangeRate::new(quote) {
        Ok(rate) => recorder.record(rate),
        Err(e) => warn!("db: not saving quote: {}", e),
    }

    HttpResponse::Ok().json(response)
}

fn message(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(Message::new(message))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<{}>", e))
}
