//! Retriever CLI
//!
//! Runs the caching source-code proxy, or performs one-off lookups.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use retriever_api::{shutdown_signal, ApiConfig, ApiServer, AppState};
use retriever_core::constants::DEFAULT_PORT;
use retriever_core::traits::ContractInspector;
use retriever_core::types::validate_address;
use retriever_resolver::{RpcClient, SourceOrigin};

/// Retriever - caching proxy for verified contract source code
#[derive(Parser)]
#[command(name = "retriever")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database URL (libsql://...) or local path; omit to keep rows in memory
    #[arg(long, env = "DSN", global = true)]
    dsn: Option<String>,

    /// Auth token for a remote database
    #[arg(long, env = "DSN_AUTH_TOKEN", global = true, hide_env_values = true)]
    auth_token: Option<String>,

    /// Etherscan API key
    #[arg(long, env = "APIKEY", global = true, hide_env_values = true)]
    apikey: Option<String>,

    /// Ethereum RPC URL
    #[arg(long, env = "RPCURL", global = true)]
    rpc: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: IpAddr,
    },

    /// Resolve one address and print its source record
    Fetch {
        /// Contract address
        address: String,
    },

    /// Check whether an address holds code, and hash it
    Check {
        /// Contract address
        address: String,
    },
}

impl Cli {
    fn api_config(&self) -> Result<ApiConfig> {
        let apikey = self
            .apikey
            .clone()
            .context("Etherscan API key is required (--apikey or APIKEY)")?;
        let rpc = self.rpc_url()?;

        let mut config = ApiConfig::new(apikey, rpc);
        if let Some(dsn) = &self.dsn {
            config = config.with_dsn(dsn, self.auth_token.clone());
        }
        config.validate()?;
        Ok(config)
    }

    fn rpc_url(&self) -> Result<String> {
        self.rpc
            .clone()
            .filter(|url| !url.trim().is_empty())
            .context("Ethereum RPC URL is required (--rpc or RPCURL)")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env values override the process environment
    let _ = dotenvy::dotenv_override();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "retriever=debug,info"
    } else {
        "retriever=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &cli.command {
        Commands::Serve { port, bind } => cmd_serve(&cli, *bind, *port).await,
        Commands::Fetch { address } => cmd_fetch(&cli, address).await,
        Commands::Check { address } => cmd_check(&cli, address).await,
    }
}

/// Run the HTTP server until Ctrl-C / SIGTERM
async fn cmd_serve(cli: &Cli, bind: IpAddr, port: u16) -> Result<()> {
    let config = cli.api_config()?;
    let state = Arc::new(
        AppState::from_config(&config)
            .await
            .context("Failed to initialize service")?,
    );

    let addr = SocketAddr::new(bind, port);
    println!("{} {}", "🚀 Starting retriever on".cyan().bold(), addr);
    println!("   {} GET /code/:address", "Endpoint:".dimmed());
    println!("   {} GET /health", "Endpoint:".dimmed());

    ApiServer::new(state.clone())
        .run(addr, shutdown_signal())
        .await
        .context("Server error")?;

    state.shutdown().await;
    info!("Cache loops stopped");
    Ok(())
}

/// Resolve one address through cache, store and upstream
async fn cmd_fetch(cli: &Cli, address: &str) -> Result<()> {
    let address = validate_address(address)?;
    println!("{} {}", "🔍 Fetching source for:".cyan().bold(), address);

    let config = cli.api_config()?;
    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize service")?;

    if !state.resolver.is_contract(address).await? {
        state.shutdown().await;
        bail!("{address} is not a contract");
    }

    let result = state.resolver.resolve_full(address).await;
    state.shutdown().await;
    let result = result.context("Failed to resolve source")?;

    let origin = match result.origin {
        SourceOrigin::Cache => "cache",
        SourceOrigin::Store => "database",
        SourceOrigin::Upstream => "Etherscan",
    };

    println!("\n{}", "✅ Source found:".green().bold());
    println!("   {} {}", "Contract:".dimmed(), result.source.contract_name);
    println!("   {} {}", "Compiler:".dimmed(), result.source.compiler_version);
    println!("   {} {}", "From:".dimmed(), origin);
    if result.resolved_address != address {
        println!("   {} {}", "Implementation:".yellow(), result.resolved_address);
    }

    println!("\n{}", "📋 Source record (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&*result.source)?);

    Ok(())
}

/// Check for deployed code
async fn cmd_check(cli: &Cli, address: &str) -> Result<()> {
    let address = validate_address(address)?;
    println!("{} {}", "🔎 Checking:".cyan().bold(), address);

    let client = RpcClient::new(cli.rpc_url()?)?;

    if !client.is_contract(address).await? {
        println!("\n{}", "⚠️  No code at this address (EOA or self-destructed).".yellow());
        return Ok(());
    }

    let hash = client.code_hash(address).await?;
    println!("\n{}", "✅ Contract".green().bold());
    println!("   {} {}", "Code hash:".dimmed(), hash);

    Ok(())
}
