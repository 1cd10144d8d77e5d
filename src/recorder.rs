//! Best-effort persistence of exchange rates off the request path.
//!
//! Handlers hand records to a [`Recorder`]; a single writer task owned by the
//! server runs each insert under its own deadline. Failures are logged and
//! dropped. [`RecorderHandle::shutdown`] is the point where every accepted
//! record has either been written or given up on.

use std::{sync::Arc, time::Duration};

use log::{debug, error, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinHandle, JoinSet},
};

use crate::{exchange_rate::ExchangeRate, store::ExchangeRateStore};

#[derive(Clone)]
pub struct Recorder {
    tx: mpsc::UnboundedSender<ExchangeRate>,
}

pub struct RecorderHandle {
    close: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Recorder {
    pub fn spawn(store: Arc<dyn ExchangeRateStore>, deadline: Duration) -> (Recorder, RecorderHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (close, closed) = oneshot::channel();
        let task = tokio::spawn(run_writer(store, deadline, rx, closed));

        (Recorder { tx }, RecorderHandle { close, task })
    }

    /// Queues `rate` for persistence without waiting for it.
    pub fn record(&self, rate: ExchangeRate) {
        if let Err(e) = self.tx.send(rate) {
            warn!("db: recorder closed, dropping {}", e.0.id);
        }
    }
}

impl RecorderHandle {
    /// Stops the writer after draining queued records and awaiting
    /// in-flight writes.
    pub async fn shutdown(self) {
        let _ = self.close.send(());
        if let Err(e) = self.task.await {
            error!("db: writer task failed: {}", e);
        }
    }
}

async fn run_writer(
    store: Arc<dyn ExchangeRateStore>,
    deadline: Duration,
    mut rx: mpsc::UnboundedReceiver<ExchangeRate>,
    mut closed: oneshot::Receiver<()>,
) {
    let mut writes = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut closed => break,
            received = rx.recv() => match received {
                Some(rate) => {
                    writes.spawn(persist(store.clone(), rate, deadline));
                }
                None => break,
            },
            Some(_) = writes.join_next(), if !writes.is_empty() => {}
        }
    }

    rx.close();
    while let Some(rate) = rx.recv().await {
        writes.spawn(persist(store.clone(), rate, deadline));
    }
    while writes.join_next().await.is_some() {}
}

async fn persist(store: Arc<dyn ExchangeRateStore>, rate: ExchangeRate, deadline: Duration) {
    match tokio::time::timeout(deadline, store.create(&rate)).await {
        Ok(Ok(())) => debug!("db: saved {}", rate.id),
        Ok(Err(e)) => error!("db: {}", e),
        Err(_) => warn!("db: deadline of {:?} exceeded saving {}", deadline, rate.id),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::exchange_rate::sample_quote;

    /// In-memory store that can be told to stall or fail.
    #[derive(Default)]
    pub struct FakeStore {
        pub saved: Mutex<Vec<ExchangeRate>>,
        pub delay: Duration,
        pub fail: bool,
    }

    #[async_trait]
    impl ExchangeRateStore for FakeStore {
        async fn create(&self, rate: &ExchangeRate) -> Result<(), sqlx::Error> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(sqlx::Error::PoolClosed);
            }
            self.saved.lock().unwrap().push(rate.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_waits_for_queued_writes() {
        let store = Arc::new(FakeStore::default());
        let (recorder, handle) = Recorder::spawn(store.clone(), Duration::from_secs(1));

        for _ in 0..3 {
            recorder.record(ExchangeRate::new(sample_quote()).unwrap());
        }
        handle.shutdown().await;

        assert_eq!(store.saved.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn slow_write_is_abandoned_after_deadline() {
        let store = Arc::new(FakeStore {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let (recorder, handle) = Recorder::spawn(store.clone(), Duration::from_millis(10));

        recorder.record(ExchangeRate::new(sample_quote()).unwrap());
        handle.shutdown().await;

        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_the_writer() {
        let store = Arc::new(FakeStore {
            fail: true,
            ..Default::default()
        });
        let (recorder, handle) = Recorder::spawn(store.clone(), Duration::from_secs(1));

        recorder.record(ExchangeRate::new(sample_quote()).unwrap());
        recorder.record(ExchangeRate::new(sample_quote()).unwrap());
        handle.shutdown().await;

        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_after_shutdown_is_dropped() {
        let store = Arc::new(FakeStore::default());
        let (recorder, handle) = Recorder::spawn(store.clone(), Duration::from_secs(1));
        handle.shutdown().await;

        recorder.record(ExchangeRate::new(sample_quote()).unwrap());

        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_through_to_sqlite() {
        let store = Arc::new(crate::store::memory_store().await);
        let (recorder, handle) = Recorder::spawn(store.clone(), Duration::from_secs(1));

        recorder.record(ExchangeRate::new(sample_quote()).unwrap());
        handle.shutdown().await;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exchange_rates")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
