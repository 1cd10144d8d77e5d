use std::{future::Future, sync::Arc};

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;
use log::info;
use reqwest::Client;

use crate::{
    config::ServerConfig,
    handler::get_exchange_rate,
    recorder::Recorder,
    store::{ExchangeRateStore, SqliteStore},
    upstream::{HttpQuoteSource, QuoteSource},
};

/// Serves `/cotacao` until SIGINT, SIGTERM or SIGHUP, then waits for
/// in-flight requests and pending writes.
pub async fn run(config: ServerConfig) -> Result<()> {
    let store = SqliteStore::connect(&config.db_url).await?;
    store.migrate().await?;
    let store: Arc<dyn ExchangeRateStore> = Arc::new(store);
    let (recorder, recorder_handle) = Recorder::spawn(store, config.deadlines.persist);

    let source: Arc<dyn QuoteSource> =
        Arc::new(HttpQuoteSource::new(Client::new(), config.upstream_url.clone()));
    let source = web::Data::from(source);
    let recorder = web::Data::new(recorder);
    let deadlines = web::Data::new(config.deadlines.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(source.clone())
            .app_data(recorder.clone())
            .app_data(deadlines.clone())
            .service(get_exchange_rate)
    })
    .disable_signals()
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .bind((config.host.as_str(), config.port))?
    .run();

    let shutdown = shutdown_signal()?;
    let handle = server.handle();
    tokio::spawn(async move {
        shutdown.await;
        info!("server: shutting down");
        handle.stop(true).await;
    });

    info!("Server is running at http://{}:{}", config.host, config.port);
    server.await?;

    recorder_handle.shutdown().await;
    info!("server stopped");

    Ok(())
}

#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
            _ = hangup.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}
