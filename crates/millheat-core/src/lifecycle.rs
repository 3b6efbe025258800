// ── Application lifecycle ──
//
// Explicit, observable process state. Each dimension is a `watch`
// channel so the poll loop (and the daemon) can await transitions
// instead of polling flags. Only the transition functions below write.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// Overall application state. The poll loop runs only in `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AppState {
    Starting,
    Configuring,
    NotConfigured,
    Running,
}

/// Reachability of the vendor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AuthState {
    NotAuthenticated,
    InProgress,
    Authenticated,
    /// The vendor rejected the login; operator action needed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConfigState {
    NotConfigured,
    Configured,
}

/// Shared lifecycle context, cheaply cloneable.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

#[derive(Debug)]
struct LifecycleInner {
    app: watch::Sender<AppState>,
    connection: watch::Sender<ConnectionState>,
    auth: watch::Sender<AuthState>,
    config: watch::Sender<ConfigState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                app: watch::Sender::new(AppState::Starting),
                connection: watch::Sender::new(ConnectionState::Disconnected),
                auth: watch::Sender::new(AuthState::NotAuthenticated),
                config: watch::Sender::new(ConfigState::NotConfigured),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn app_state(&self) -> AppState {
        *self.inner.app.borrow()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.connection.borrow()
    }

    pub fn auth_state(&self) -> AuthState {
        *self.inner.auth.borrow()
    }

    pub fn config_state(&self) -> ConfigState {
        *self.inner.config.borrow()
    }

    pub fn subscribe_app(&self) -> watch::Receiver<AppState> {
        self.inner.app.subscribe()
    }

    // ── Transitions ──────────────────────────────────────────────

    pub fn configuring(&self) {
        self.set_app(AppState::Configuring);
    }

    /// Configuration is complete; does not by itself start polling.
    pub fn configured(&self) {
        let old = self.inner.config.send_replace(ConfigState::Configured);
        if old != ConfigState::Configured {
            info!(config_state = %ConfigState::Configured, "config state changed");
        }
    }

    /// Configuration was removed (e.g. de-authorized). Pauses polling.
    pub fn not_configured(&self) {
        self.inner.config.send_replace(ConfigState::NotConfigured);
        self.set_app(AppState::NotConfigured);
    }

    /// Enter `Running`; the poll loop resumes.
    pub fn start_running(&self) {
        self.set_app(AppState::Running);
    }

    pub fn mark_connected(&self) {
        self.set_connection(ConnectionState::Connected);
    }

    pub fn mark_disconnected(&self) {
        self.set_connection(ConnectionState::Disconnected);
    }

    pub fn mark_auth_in_progress(&self) {
        self.set_auth(AuthState::InProgress);
    }

    pub fn mark_authenticated(&self) {
        self.set_auth(AuthState::Authenticated);
    }

    /// The vendor rejected the login. Always logged at error level.
    pub fn mark_auth_failed(&self) {
        error!("authentication with the Mill API failed; run `millheat login` again");
        self.set_auth(AuthState::Failed);
        self.set_connection(ConnectionState::Disconnected);
    }

    /// The session can no longer heal itself.
    pub fn mark_unauthenticated(&self) {
        self.set_auth(AuthState::NotAuthenticated);
        self.set_connection(ConnectionState::Disconnected);
    }

    // ── Internals ────────────────────────────────────────────────

    fn set_app(&self, state: AppState) {
        let old = self.inner.app.send_replace(state);
        if old != state {
            info!(from = %old, to = %state, "app state changed");
        }
    }

    fn set_connection(&self, state: ConnectionState) {
        let old = self.inner.connection.send_replace(state);
        if old != state {
            info!(from = %old, to = %state, "connection state changed");
        }
    }

    fn set_auth(&self, state: AuthState) {
        let old = self.inner.auth.send_replace(state);
        if old != state {
            info!(from = %old, to = %state, "auth state changed");
        }
    }
}
