//! # Application registry
//!
//! `serve` runs the tenant-scoped application management API.
//! `verify` drives the success-path scenario against a running server:
//!
//! ```bash
//! app-registry serve --config config/local.toml
//! app-registry verify --base-url http://127.0.0.1:9443 \
//!     --tenant carbon.super --token root-admin-token
//! ```

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use app_registry::client::{Credentials, RegistryClient, ScenarioRunner};
use app_registry::config::ServerConfig;
use app_registry::provider::StandardApplicationProvider;
use app_registry::server::{self, AppState, RequestLimits};
use app_registry::storage::InMemoryStorage;
use app_registry::tenant::SUPER_TENANT_DOMAIN;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "app-registry", version, about = "Tenant-scoped application registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Configuration file layered above config/default and config/local
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the success-path scenario against a running server
    Verify {
        #[arg(long, default_value = "http://127.0.0.1:9443")]
        base_url: String,
        #[arg(long, default_value = SUPER_TENANT_DOMAIN)]
        tenant: String,
        #[arg(long, env = "APP_REGISTRY_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { config, host, port } => run_serve(config, host, port).await,
        Command::Verify {
            base_url,
            tenant,
            token,
        } => run_verify(base_url, Credentials::new(tenant, token)).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), String> {
    let mut config = ServerConfig::load_from(config_path.as_deref())
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    let resolver = config.tenant_resolver();
    let credential_count = resolver.credential_count();
    if credential_count == 0 {
        warn!("No credentials configured, every API request will be rejected");
    }

    let provider = StandardApplicationProvider::new(InMemoryStorage::new());
    let state = AppState::new(provider, resolver, config.location())
        .with_default_page_size(config.default_page_size);
    let router = server::build_router(state, RequestLimits::from_config(&config));

    let listener = TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.bind_address(), e))?;
    info!(
        "Serving {} tenant credential(s), public base URL {}",
        credential_count,
        config.location().public_base_url
    );

    server::serve(listener, router)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

async fn run_verify(base_url: String, credentials: Credentials) -> Result<(), String> {
    let client = RegistryClient::new(base_url)
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
    let report = ScenarioRunner::new(&client, credentials).run().await;
    print!("{}", report);

    if report.passed() {
        Ok(())
    } else {
        Err(format!(
            "Scenario failed for tenant '{}': {} failing step(s)",
            report.tenant,
            report.failures().count()
        ))
    }
}
