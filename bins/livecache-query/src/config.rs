//! Command line for one-off cache queries

use clap::{Args, Parser, Subcommand};

/// Query a live-cache service
#[derive(Parser, Debug)]
#[command(name = "livecache-query")]
#[command(about = "Run a single view or operation against a live-cache service", long_about = None)]
pub struct Config {
    /// Cache service base URL
    #[arg(long, env = "LIVECACHE_URL", default_value = livecache::grab::DEFAULT_CACHE_URL)]
    pub cache_url: String,

    /// Bearer credential sent with every call
    #[arg(long, env = "LIVECACHE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Override the scheme's default resource key
    #[arg(long, global = true)]
    pub resource: Option<String>,

    /// Per-call timeout in seconds (default: none)
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub scheme: SchemeCommand,
}

#[derive(Subcommand, Debug)]
pub enum SchemeCommand {
    /// Fungible balances
    #[command(subcommand)]
    Erc20(Erc20Command),
    /// Non-fungible ownership
    #[command(subcommand)]
    Erc721(Erc721Command),
    /// Semi-fungible ownership
    #[command(subcommand)]
    Erc1155(Erc1155Command),
}

#[derive(Args, Debug)]
pub struct Page {
    #[arg(long, default_value = "0")]
    pub offset: u32,

    #[arg(long, default_value = "100")]
    pub limit: u32,
}

#[derive(Subcommand, Debug)]
pub enum Erc20Command {
    /// Balance of one owner
    BalanceOf { contract_key: String, owner: String },
    /// All balances of a contract
    Balances {
        contract_key: String,
        #[command(flatten)]
        page: Page,
    },
    /// Drop the cache for a contract
    Reset { contract_key: String },
}

#[derive(Subcommand, Debug)]
pub enum Erc721Command {
    /// Tokens owned by one owner
    CollectionOf {
        contract_key: String,
        owner: String,
        #[command(flatten)]
        page: Page,
    },
    /// All ownerships of a contract
    Collections {
        contract_key: String,
        #[command(flatten)]
        page: Page,
    },
    /// Drop the cache for a contract
    Reset { contract_key: String },
}

#[derive(Subcommand, Debug)]
pub enum Erc1155Command {
    /// Amount of one token held by one owner
    BalanceOf {
        contract_key: String,
        owner: String,
        /// Token id, hex with or without 0x
        token: String,
    },
    /// Token balances of one owner
    BalancesOf {
        contract_key: String,
        owner: String,
        #[command(flatten)]
        page: Page,
    },
    /// All balances of a contract
    Balances {
        contract_key: String,
        #[command(flatten)]
        page: Page,
    },
    /// Drop the cache for a contract
    Reset { contract_key: String },
}
