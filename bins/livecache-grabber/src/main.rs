//! Livecache grabber - logs state drained from a live-cache service.
//!
//! # Usage
//!
//! ```bash
//! # Drain every 30 seconds
//! LIVECACHE_API_KEY=secret livecache-grabber --interval 30
//!
//! # Keep going after failures, retrying a minute later
//! livecache-grabber --restart-after 60
//! ```

mod config;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use config::Config;
use livecache::cache::{Erc1155Ownership, Erc20Balance, Erc721Ownership, GrabbedItem};
use livecache::grab::{GrabError, GrabErrorHandler, GrabLoop, ItemProcessor};

/// Logs every item, decoded by the shape of its fields.
struct LogProcessor;

#[async_trait]
impl ItemProcessor for LogProcessor {
    async fn process_item(&self, item: GrabbedItem) -> anyhow::Result<()> {
        let contract_key = item.contract_key().unwrap_or("<none>");
        match (item.get("token").is_some(), item.get("amount").is_some()) {
            (true, true) => {
                let record: Erc1155Ownership = item.record();
                tracing::info!(
                    target: "livecache::grabber",
                    contract_key,
                    owner = %record.owner,
                    token = ?record.token,
                    amount = %record.amount,
                    "Ownership"
                );
            }
            (true, false) => {
                let record: Erc721Ownership = item.record();
                tracing::info!(
                    target: "livecache::grabber",
                    contract_key,
                    owner = %record.owner,
                    token = ?record.token,
                    "Ownership"
                );
            }
            (false, true) => {
                let record: Erc20Balance = item.record();
                tracing::info!(
                    target: "livecache::grabber",
                    contract_key,
                    owner = %record.owner,
                    amount = %record.amount,
                    "Balance"
                );
            }
            (false, false) => {
                tracing::info!(
                    target: "livecache::grabber",
                    contract_key,
                    fields = ?item.fields(),
                    "State item"
                );
            }
        }
        Ok(())
    }
}

struct LogErrors;

#[async_trait]
impl GrabErrorHandler for LogErrors {
    async fn on_grab_error(&self, error: &GrabError) {
        tracing::warn!(
            target: "livecache::grabber",
            context = error.context(),
            http_code = error.http_code(),
            "Run ended: {}",
            error
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "livecache::grabber", "Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(target: "livecache::grabber", "Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!(target: "livecache::grabber", "Received SIGINT (Ctrl+C), stopping");
        }
        _ = terminate => {
            tracing::info!(target: "livecache::grabber", "Received SIGTERM, stopping");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("Starting livecache grabber");
    tracing::info!("Cache URL: {}", config.cache_url);
    tracing::info!("State resource: {}", config.state_resource);

    let grabber = GrabLoop::with_error_handler(config.grabber_config(), LogProcessor, LogErrors);
    tracing::info!("Interval: {:?}", grabber.interval());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        grabber.start(config.clock());

        tokio::select! {
            () = grabber.join() => {}
            () = &mut shutdown => {
                grabber.stop();
                grabber.join().await;
                break;
            }
        }

        let Some(backoff) = config.restart_after() else {
            break;
        };
        tracing::info!("Restarting in {:?}", backoff);
        tokio::select! {
            () = tokio::time::sleep(backoff) => {}
            () = &mut shutdown => break,
        }
    }

    tracing::info!("Livecache grabber stopped");
    Ok(())
}
