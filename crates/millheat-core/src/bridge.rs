// ── Bridge facade ──
//
// Wires the session, fetcher, poll loop and collaborators together.
// Cheaply cloneable; background tasks hold their own clone of the
// shared pieces and stop when `shutdown()` cancels the root token.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use millheat_api::{MillClient, TransportConfig};

use crate::config::{AccountCredentials, BridgeConfig};
use crate::error::CoreError;
use crate::fetcher::InventoryFetcher;
use crate::lifecycle::Lifecycle;
use crate::model::Credential;
use crate::poller::{PollLoop, PollState};
use crate::publish::Publisher;
use crate::session::SessionManager;
use crate::store::StateStore;

/// The running bridge between the Mill cloud and the message bus.
#[derive(Clone)]
pub struct Bridge {
    pub(crate) inner: Arc<BridgeInner>,
}

pub(crate) struct BridgeInner {
    config: BridgeConfig,
    pub(crate) session: Arc<SessionManager>,
    fetcher: InventoryFetcher,
    lifecycle: Lifecycle,
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn StateStore>,
    cancel: CancellationToken,
    poll_state: Mutex<Option<watch::Receiver<PollState>>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Bridge {
    /// Create a bridge from configuration and a previously persisted
    /// credential. Does not start polling: call [`start()`](Self::start).
    pub fn new(
        config: BridgeConfig,
        credential: Credential,
        lifecycle: Lifecycle,
        publisher: Arc<dyn Publisher>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = MillClient::new(&config.api_url, &transport)?;
        Ok(Self::with_client(
            config, client, credential, lifecycle, publisher, store,
        ))
    }

    /// Create a bridge around an existing vendor client.
    pub fn with_client(
        config: BridgeConfig,
        client: MillClient,
        credential: Credential,
        lifecycle: Lifecycle,
        publisher: Arc<dyn Publisher>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(
            client.clone(),
            credential,
            lifecycle.clone(),
        ));
        Self {
            inner: Arc::new(BridgeInner {
                config,
                session,
                fetcher: InventoryFetcher::new(client),
                lifecycle,
                publisher,
                store,
                cancel: CancellationToken::new(),
                poll_state: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build a poll loop over this bridge's collaborators.
    pub fn poll_loop(&self) -> PollLoop {
        PollLoop::new(
            Arc::clone(&self.inner.session),
            self.inner.fetcher.clone(),
            Arc::clone(&self.inner.publisher),
            Arc::clone(&self.inner.store),
            self.inner.lifecycle.clone(),
            self.inner.config.poll_interval,
        )
    }

    /// Spawn the poll loop. It stays paused until the lifecycle enters
    /// `Running`.
    pub async fn start(&self) {
        let poll = self.poll_loop();
        *self.inner.poll_state.lock().await = Some(poll.subscribe_state());

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(poll.run(cancel));
        self.inner.task_handles.lock().await.push(handle);
        info!(
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "poll loop spawned"
        );
    }

    /// Current poll loop state, once [`start()`](Self::start) has run.
    pub async fn poll_state(&self) -> Option<PollState> {
        self.inner
            .poll_state
            .lock()
            .await
            .as_ref()
            .map(|rx| *rx.borrow())
    }

    /// Run the full login flow: obtain an authorization code, exchange
    /// it for a credential, persist it and enter `Running`.
    pub async fn login(&self, account: &AccountCredentials) -> Result<Arc<Credential>, CoreError> {
        let session = &self.inner.session;
        let code = session
            .request_authorization_code(&account.access_key, &account.secret_token)
            .await?;
        let credential = session
            .authorize(&code, &account.username, &account.password)
            .await?;

        self.inner.store.save_credential(&credential)?;
        self.inner.lifecycle.configured();
        self.inner.lifecycle.start_running();
        Ok(credential)
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        debug!("bridge shut down");
    }
}
