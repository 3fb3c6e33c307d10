//! Relay settings service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Admin (form / relay-cli)
//!        │  POST /settings, GET /settings/check/{field}
//!        ▼
//!   ┌──────────┐    ┌──────────────────────────┐    ┌────────────────┐
//!   │  http +  │───▶│ ConfigurationController  │───▶│ SettingsStore  │──▶ settings file
//!   │  admin   │    │ (check, bind, transact)  │    │ (ArcSwap +     │    (secrets
//!   └──────────┘    └────────────┬─────────────┘    │  writer lock)  │     encrypted)
//!                                │ after save       └───────▲────────┘
//!                                ▼                          │ pull snapshot
//!                       ┌──────────────────┐                │
//!                       │ RelayBootstrapper│────────────────┘
//!                       │     reinit()     │──▶ message broker
//!                       └──────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use relay_settings::config::loader::load_or_default;
use relay_settings::config::watcher::SettingsWatcher;
use relay_settings::config::AdminConfig;
use relay_settings::http::{AppState, HttpServer};
use relay_settings::observability::{logging, metrics};
use relay_settings::relay::{NoopBootstrapper, ProbingBootstrapper, RelayBootstrapper};
use relay_settings::settings::{ConfigurationController, SecretCipher, SettingsStore};
use relay_settings::Shutdown;

#[derive(Parser)]
#[command(name = "relay-settings")]
#[command(about = "Global settings service for the CI event relay", long_about = None)]
struct Args {
    /// Service configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("relay-settings v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        settings_path = %config.storage.settings_path,
        relay_enabled = config.relay.enabled,
        watch = config.storage.watch,
        "Configuration loaded"
    );

    if config.admin.api_key == AdminConfig::default().api_key {
        tracing::warn!("admin.api_key is the built-in placeholder; set a real key");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let cipher = SecretCipher::load_or_create(&config.storage.key_path());
    let store = Arc::new(SettingsStore::load(config.storage.settings_path(), cipher));

    let relay: Arc<dyn RelayBootstrapper> = if config.relay.enabled {
        Arc::new(ProbingBootstrapper::new(store.clone(), &config.relay))
    } else {
        Arc::new(NoopBootstrapper)
    };

    if config.relay.enabled && config.relay.reinit_on_startup && store.are_settings_valid() {
        let relay = relay.clone();
        tokio::spawn(async move {
            if let Err(e) = relay.reinit().await {
                tracing::warn!(error = %e, "Startup relay reinit failed");
            }
        });
    }

    let shutdown = Arc::new(Shutdown::new());

    // Dropping the handle stops the watcher, so keep it for the server's lifetime.
    let _watcher = if config.storage.watch {
        let (watcher, mut updates) = SettingsWatcher::new(store.clone());
        let handle = watcher.run()?;
        let relay = relay.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = updates.recv() => {
                        if update.is_none() {
                            break;
                        }
                        if let Err(e) = relay.reinit().await {
                            tracing::warn!(error = %e, "Relay reinit after reload failed");
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
        });
        Some(handle)
    } else {
        None
    };

    let controller = Arc::new(ConfigurationController::new(store, relay));
    let state = AppState::new(controller, &config.admin.api_key);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, state);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        signal.trigger_on_ctrl_c().await;
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
