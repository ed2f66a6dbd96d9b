use crate::state::messages::{NetworkResponse, RequestKind};
use courtside_api::BatchStatus;
use courtside_api::client::SimApi;
use log::{info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Gives up after this many consecutive failed status checks.
const MAX_FAILURES: u32 = 5;

/// Watches one background batch of simulated games. Reports progress while it
/// runs and sends `BatchFinished` exactly once when it is done.
pub struct BatchWatcher {
    client: SimApi,
    batch_id: String,
    responses: mpsc::Sender<NetworkResponse>,
    period: Duration,
}

impl BatchWatcher {
    pub fn new(
        client: SimApi,
        batch_id: String,
        responses: mpsc::Sender<NetworkResponse>,
        period: Duration,
    ) -> Self {
        Self {
            client,
            batch_id,
            responses,
            period,
        }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.period);
        let mut failures = 0;
        let mut last_progress = None;

        loop {
            ticker.tick().await;
            match self.client.fetch_batch_status(&self.batch_id).await {
                Ok(BatchStatus::Done) => {
                    info!("batch {} finished", self.batch_id);
                    let _ = self
                        .responses
                        .send(NetworkResponse::BatchFinished {
                            batch_id: self.batch_id.clone(),
                        })
                        .await;
                    return;
                }
                Ok(BatchStatus::Running { completed, total }) => {
                    failures = 0;
                    if last_progress == Some((completed, total)) {
                        continue;
                    }
                    last_progress = Some((completed, total));
                    let sent = self
                        .responses
                        .send(NetworkResponse::BatchProgress {
                            batch_id: self.batch_id.clone(),
                            completed,
                            total,
                        })
                        .await;
                    if sent.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("batch {} status check failed ({failures}): {e}", self.batch_id);
                    if failures >= MAX_FAILURES {
                        let _ = self
                            .responses
                            .send(NetworkResponse::Error {
                                kind: RequestKind::WatchBatch,
                                message: format!("stopped watching batch {}: {e}", self.batch_id),
                            })
                            .await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finishes_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let running = server
            .mock("GET", "/batches/b1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "status": "running", "completed": 1, "total": 4 }"#)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel(16);
        let watcher = BatchWatcher::new(
            SimApi::new(server.url()),
            "b1".into(),
            tx,
            Duration::from_millis(5),
        );
        let handle = tokio::spawn(watcher.run());

        match rx.recv().await {
            Some(NetworkResponse::BatchProgress { completed, total, .. }) => {
                assert_eq!((completed, total), (1, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
        running.remove_async().await;

        server
            .mock("GET", "/batches/b1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "status": "done" }"#)
            .create_async()
            .await;

        match rx.recv().await {
            Some(NetworkResponse::BatchFinished { batch_id }) => assert_eq!(batch_id, "b1"),
            other => panic!("unexpected {other:?}"),
        }
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn repeated_failures_stop_the_watch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/batches/b9")
            .with_status(500)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel(16);
        BatchWatcher::new(SimApi::new(server.url()), "b9".into(), tx, Duration::from_millis(1))
            .run()
            .await;
        assert!(matches!(rx.recv().await, Some(NetworkResponse::Error { .. })));
        assert!(rx.recv().await.is_none());
    }
}
