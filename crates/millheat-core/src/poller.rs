// ── Poll loop ──
//
// The process-lifetime driver. Two states: `Paused` waits on the
// lifecycle for `Running`; `Polling` ticks on a fixed interval. Leaving
// `Running` interrupts the timer wait and an in-flight fetch, so no
// further inventory calls are issued once the app is paused. The token
// check runs to completion first: a refresh the vendor has already
// answered must be stored, or the retired refresh token is all we keep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::facts::snapshot_facts;
use crate::fetcher::InventoryFetcher;
use crate::lifecycle::{AppState, Lifecycle};
use crate::publish::Publisher;
use crate::session::{Freshness, SessionManager};
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PollState {
    Paused,
    Polling,
}

/// What one tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Facts were derived and handed to the publisher.
    Published {
        /// Facts the publisher accepted.
        facts: usize,
        /// Branches of the inventory walk that were skipped.
        degraded: usize,
    },
    /// No usable credential; nothing was fetched.
    Skipped(Freshness),
    /// The home list could not be fetched; nothing was published.
    FetchFailed(CoreError),
}

pub struct PollLoop {
    session: Arc<SessionManager>,
    fetcher: InventoryFetcher,
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn StateStore>,
    lifecycle: Lifecycle,
    interval: Duration,
    state: watch::Sender<PollState>,
}

impl PollLoop {
    pub fn new(
        session: Arc<SessionManager>,
        fetcher: InventoryFetcher,
        publisher: Arc<dyn Publisher>,
        store: Arc<dyn StateStore>,
        lifecycle: Lifecycle,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            fetcher,
            publisher,
            store,
            lifecycle,
            interval,
            state: watch::Sender::new(PollState::Paused),
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Drive the loop until `cancel` fires.
    ///
    /// The first tick runs as soon as the app enters `Running`; later
    /// ticks follow the configured interval.
    pub async fn run(self, cancel: CancellationToken) {
        let mut app_rx = self.lifecycle.subscribe_app();

        loop {
            self.set_state(PollState::Paused);
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                entered = entered_running(&mut app_rx) => {
                    if !entered {
                        break;
                    }
                }
            }

            self.set_state(PollState::Polling);
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    () = left_running(&mut app_rx) => break,
                    _ = interval.tick() => {}
                }

                // Bounded by the request timeout; never abandoned halfway.
                let freshness = self.refresh_session(Utc::now().timestamp_millis()).await;

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    () = left_running(&mut app_rx) => {
                        info!("app left running state; abandoning in-flight poll tick");
                        break;
                    }
                    outcome = self.poll_inventory(freshness) => debug!(?outcome, "poll tick finished"),
                }
            }
        }
        debug!("poll loop stopped");
    }

    /// Run one tick against the wall clock.
    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(Utc::now().timestamp_millis()).await
    }

    /// Run one tick as if the time were `now_ms` (epoch milliseconds):
    /// ensure a fresh token, fetch the inventory, publish its facts and
    /// persist what changed.
    pub async fn tick_at(&self, now_ms: i64) -> TickOutcome {
        let freshness = self.refresh_session(now_ms).await;
        self.poll_inventory(freshness).await
    }

    /// Apply the token policy and persist whatever it rewrote. A session
    /// that only a new login can repair takes the app out of `Running`.
    async fn refresh_session(&self, now_ms: i64) -> Freshness {
        let freshness = self.session.ensure_fresh(now_ms).await;
        if freshness.changed_credential() {
            if let Err(e) = self.store.save_credential(&self.session.credential()) {
                warn!(error = %e, "could not persist credential");
            }
        }
        if freshness.requires_login() && self.lifecycle.app_state() == AppState::Running {
            error!(?freshness, "Mill session is unusable; polling paused until `millheat login`");
            self.lifecycle.not_configured();
        }
        freshness
    }

    async fn poll_inventory(&self, freshness: Freshness) -> TickOutcome {
        let Some(credential) = freshness.credential().cloned() else {
            debug!(?freshness, "no usable session; skipping fetch");
            return TickOutcome::Skipped(freshness);
        };

        let report = match self.fetcher.fetch_all(&credential.access_token).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "inventory fetch failed; nothing published this tick");
                return TickOutcome::FetchFailed(e);
            }
        };

        if report.snapshot.is_empty() {
            info!("account has no homes or devices; nothing to publish");
        }

        let mut published = 0;
        for fact in snapshot_facts(&report.snapshot) {
            match self.publisher.publish(&fact).await {
                Ok(()) => published += 1,
                Err(e) => warn!(device_id = %fact.device_id(), error = %e, "fact not published"),
            }
        }

        if let Err(e) = self.store.save_snapshot(&report.snapshot) {
            warn!(error = %e, "could not persist inventory snapshot");
        }

        TickOutcome::Published {
            facts: published,
            degraded: report.failures.len(),
        }
    }

    fn set_state(&self, state: PollState) {
        let old = self.state.send_replace(state);
        if old != state {
            info!(from = %old, to = %state, "poll loop state changed");
        }
    }
}

async fn entered_running(rx: &mut watch::Receiver<AppState>) -> bool {
    rx.wait_for(|s| *s == AppState::Running).await.is_ok()
}

/// Resolves once the app is no longer `Running` (or the lifecycle is gone).
async fn left_running(rx: &mut watch::Receiver<AppState>) {
    let _ = rx.wait_for(|s| *s != AppState::Running).await;
}
