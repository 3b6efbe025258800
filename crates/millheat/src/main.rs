mod cli;
mod error;
mod mqtt;

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use millheat_config::{Config, FileStateStore, LogFormat};
use millheat_core::{Bridge, ChannelPublisher, Lifecycle, TokenAction};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::mqtt::MqttPublisher;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Set up stderr logging plus an optional log file. The returned guard
/// must live until exit so buffered file output is flushed.
fn init_tracing(log: &millheat_config::Log, verbosity: u8) -> Option<WorkerGuard> {
    let level = match verbosity {
        0 => log.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_writer, guard) = match &log.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("millheat.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .init(),
    }

    guard
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let work_dir = cli
        .work_dir
        .unwrap_or_else(millheat_config::default_work_dir);
    let config_path = millheat_config::config_path(&work_dir);
    let config = millheat_config::load_config(&work_dir)
        .map_err(|e| CliError::from_config(e, &config_path))?;

    let _guard = init_tracing(&config.log, cli.verbose);
    info!(work_dir = %work_dir.display(), "millheat starting");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(&work_dir, &config).await,
        Command::Login => login(&work_dir, &config_path, &config).await,
    }
}

fn open_store(work_dir: &Path, config_path: &Path) -> Result<Arc<FileStateStore>, CliError> {
    FileStateStore::open(work_dir)
        .map(Arc::new)
        .map_err(|e| CliError::from_config(e, config_path))
}

/// Poll and publish until Ctrl-C.
async fn run_daemon(work_dir: &Path, config: &Config) -> Result<(), CliError> {
    let config_path = millheat_config::config_path(work_dir);
    let bridge_config = millheat_config::to_bridge_config(config)
        .map_err(|e| CliError::from_config(e, &config_path))?;
    let store = open_store(work_dir, &config_path)?;
    let credential = store.credential();

    let lifecycle = Lifecycle::new();
    lifecycle.configuring();

    let mqtt_password = millheat_config::mqtt_password(config);
    let (mqtt_client, eventloop) = mqtt::connect(&config.mqtt, mqtt_password.as_ref());
    let bridge = Bridge::new(
        bridge_config,
        credential.clone(),
        lifecycle.clone(),
        Arc::new(MqttPublisher::new(mqtt_client.clone())),
        store,
    )?;

    let cancel = CancellationToken::new();
    let mqtt_task = tokio::spawn(mqtt::run_event_loop(
        eventloop,
        mqtt_client,
        bridge.clone(),
        cancel.clone(),
    ));
    bridge.start().await;

    match credential.action_at(Utc::now().timestamp_millis()) {
        TokenAction::Unauthenticated => {
            warn!("no stored session; run `millheat login` to authorize");
            lifecycle.not_configured();
        }
        TokenAction::WindowLapsed => {
            warn!("stored session has expired; run `millheat login` to authorize again");
            lifecycle.mark_unauthenticated();
            lifecycle.not_configured();
        }
        TokenAction::Keep | TokenAction::Refresh => {
            lifecycle.configured();
            lifecycle.mark_authenticated();
            lifecycle.start_running();
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("interrupt received; shutting down");

    cancel.cancel();
    bridge.shutdown().await;
    if let Err(e) = mqtt_task.await {
        warn!(error = %e, "mqtt task ended abnormally");
    }
    Ok(())
}

/// Authorize with the configured account and store the session.
async fn login(work_dir: &Path, config_path: &Path, config: &Config) -> Result<(), CliError> {
    let account = millheat_config::account_credentials(config)
        .map_err(|e| CliError::from_config(e, config_path))?;
    let bridge_config = millheat_config::to_bridge_config(config)
        .map_err(|e| CliError::from_config(e, config_path))?;
    let store = open_store(work_dir, config_path)?;

    let bridge = Bridge::new(
        bridge_config,
        store.credential(),
        Lifecycle::new(),
        Arc::new(ChannelPublisher::new()),
        store.clone(),
    )?;
    let credential = bridge.login(&account).await?;

    let until = DateTime::<Utc>::from_timestamp_millis(credential.refresh_expire_time)
        .map_or_else(|| credential.refresh_expire_time.to_string(), |t| t.to_rfc3339());
    println!(
        "Authorized as {}. Session stored in {}; renewable until {until}.",
        account.username,
        store.path().display()
    );
    Ok(())
}
