//! Livecache query - one-off calls against a live-cache service.
//!
//! # Usage
//!
//! ```bash
//! livecache-query erc20 balance-of erc20-sample 0xAF950274754d7408B7bAA9358F5CB92D162C5c09
//! livecache-query erc721 collections erc721-sample --limit 20
//! livecache-query erc1155 balance-of erc1155-sample 0xAF95... 0x111
//! ```
//!
//! Results are printed as JSON; non-Ok codes exit with status 1.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Erc1155Command, Erc20Command, Erc721Command, SchemeCommand};
use livecache::cache::{CacheHandler, Scheme};
use livecache::remote::{Authorization, HttpTransport, Root};
use livecache::{
    decode_token_id, format_token_id, CacheResult, Erc1155OwnershipHandler, Erc20BalanceHandler,
    Erc721OwnershipHandler, TokenId,
};
use serde_json::{json, Value};

fn handler<S: Scheme>(root: &Root, resource: Option<&str>) -> CacheHandler<S> {
    match resource {
        Some(key) => CacheHandler::with_resource(root, key),
        None => CacheHandler::new(root),
    }
}

fn token_json(token: &Option<TokenId>) -> Value {
    token.as_ref().map_or(Value::Null, |t| Value::String(format_token_id(t)))
}

/// Print a result and tell whether it was Ok.
fn report<T>(result: CacheResult<T>, render: impl FnOnce(T) -> Value) -> Result<bool> {
    let code = result.code();
    let output = json!({
        "code": code.to_string(),
        "status": code.http_status(),
        "element": result.into_element().map(render),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code.is_ok())
}

async fn run_erc20(handler: Erc20BalanceHandler, command: Erc20Command) -> Result<bool> {
    match command {
        Erc20Command::BalanceOf {
            contract_key,
            owner,
        } => report(handler.balance_of(&contract_key, &owner).await?, |amount| {
            json!(amount.to_string())
        }),
        Erc20Command::Balances { contract_key, page } => report(
            handler
                .balances(&contract_key, page.offset, page.limit)
                .await?,
            |rows| {
                rows.into_iter()
                    .map(|(owner, amount)| json!({"owner": owner, "amount": amount.to_string()}))
                    .collect()
            },
        ),
        Erc20Command::Reset { contract_key } => {
            report(handler.reset(&contract_key).await?, |ack| ack)
        }
    }
}

async fn run_erc721(handler: Erc721OwnershipHandler, command: Erc721Command) -> Result<bool> {
    match command {
        Erc721Command::CollectionOf {
            contract_key,
            owner,
            page,
        } => report(
            handler
                .collection_of(&contract_key, &owner, page.offset, page.limit)
                .await?,
            |tokens| tokens.iter().map(token_json).collect(),
        ),
        Erc721Command::Collections { contract_key, page } => report(
            handler
                .collections(&contract_key, page.offset, page.limit)
                .await?,
            |rows| {
                rows.into_iter()
                    .map(|(owner, token)| json!({"owner": owner, "token": token_json(&token)}))
                    .collect()
            },
        ),
        Erc721Command::Reset { contract_key } => {
            report(handler.reset(&contract_key).await?, |ack| ack)
        }
    }
}

async fn run_erc1155(handler: Erc1155OwnershipHandler, command: Erc1155Command) -> Result<bool> {
    match command {
        Erc1155Command::BalanceOf {
            contract_key,
            owner,
            token,
        } => {
            let token = decode_token_id(&token)
                .with_context(|| format!("Invalid token id '{}'", token))?;
            report(
                handler.balance_of(&contract_key, &owner, &token).await?,
                |amount| json!(amount.to_string()),
            )
        }
        Erc1155Command::BalancesOf {
            contract_key,
            owner,
            page,
        } => report(
            handler
                .balances_of(&contract_key, &owner, page.offset, page.limit)
                .await?,
            |rows| {
                rows.into_iter()
                    .map(|(token, amount)| {
                        json!({"token": token_json(&token), "amount": amount.to_string()})
                    })
                    .collect()
            },
        ),
        Erc1155Command::Balances { contract_key, page } => report(
            handler
                .balances(&contract_key, page.offset, page.limit)
                .await?,
            |rows| {
                rows.into_iter()
                    .map(|(owner, token, amount)| {
                        json!({
                            "owner": owner,
                            "token": token_json(&token),
                            "amount": amount.to_string(),
                        })
                    })
                    .collect()
            },
        ),
        Erc1155Command::Reset { contract_key } => {
            report(handler.reset(&contract_key).await?, |ack| ack)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let authorization = Authorization::bearer(config.api_key.clone());
    let root = match config.timeout {
        Some(secs) => Root::with_transport(Arc::new(
            HttpTransport::with_timeout(
                config.cache_url.clone(),
                authorization,
                Duration::from_secs(secs),
            )
            .context("Failed to build HTTP client")?,
        )),
        None => Root::new(config.cache_url.clone(), authorization),
    };
    let resource = config.resource.as_deref();

    let ok = match config.scheme {
        SchemeCommand::Erc20(command) => run_erc20(handler(&root, resource), command).await?,
        SchemeCommand::Erc721(command) => run_erc721(handler(&root, resource), command).await?,
        SchemeCommand::Erc1155(command) => run_erc1155(handler(&root, resource), command).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
