use crate::state::batch::BatchWatcher;
use crate::state::messages::{NetworkRequest, NetworkResponse, RequestKind};
use courtside_api::client::SimApi;
use log::{debug, error};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Serves backend requests one at a time. Batch watches run as their own tasks.
pub struct NetworkWorker {
    client: SimApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
    watched_batches: HashSet<String>,
    batch_poll: Duration,
}

impl NetworkWorker {
    pub fn new(
        client: SimApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
            watched_batches: HashSet::new(),
            batch_poll: Duration::from_secs(2),
        }
    }

    pub fn with_batch_poll(mut self, period: Duration) -> Self {
        self.batch_poll = period;
        self
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let kind = request.kind();
            let quiet = kind == RequestKind::WatchBatch;
            if !quiet {
                self.start_loading_animation().await;
            }

            let result = match request {
                NetworkRequest::StartLiveGame { game_id, settings } => self
                    .client
                    .start_live_game(&game_id, &settings)
                    .await
                    .map(|quarter| NetworkResponse::QuarterLoaded { quarter }),
                NetworkRequest::ContinueGame { game_id, settings } => self
                    .client
                    .continue_game(&game_id, &settings)
                    .await
                    .map(|quarter| NetworkResponse::QuarterLoaded { quarter }),
                NetworkRequest::SimToEnd { game_id } => self
                    .client
                    .sim_to_end(&game_id)
                    .await
                    .map(|result| NetworkResponse::SimFinished { result }),
                NetworkRequest::LoadGame { game_id } => self
                    .client
                    .fetch_game(&game_id)
                    .await
                    .map(|game| NetworkResponse::GameLoaded { game }),
                NetworkRequest::RefreshStandings => self
                    .client
                    .fetch_standings()
                    .await
                    .map(|standings| NetworkResponse::StandingsLoaded { standings }),
                NetworkRequest::WatchBatch { batch_id } => Ok(self.watch_batch(batch_id)),
            };

            debug!("network request {kind:?} complete");
            if !quiet {
                self.stop_loading_animation(result.is_ok()).await;
            }

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                kind,
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    fn watch_batch(&mut self, batch_id: String) -> NetworkResponse {
        if self.watched_batches.insert(batch_id.clone()) {
            let watcher = BatchWatcher::new(
                self.client.clone(),
                batch_id.clone(),
                self.responses.clone(),
                self.batch_poll,
            );
            tokio::spawn(watcher.run());
        } else {
            debug!("batch {batch_id} already watched");
        }
        NetworkResponse::BatchProgress {
            batch_id,
            completed: 0,
            total: 0,
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
