use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use storefront_client::net::api::ApiClient;
use storefront_client::net::config::{
    ApiConfig, ApiTimeouts, DEFAULT_API_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use storefront_client::net::types::{ApiError, Credentials};
use storefront_client::state::store::Store;
use storefront_client::util::storage::{FileStorage, Storage};
use tracing_subscriber::EnvFilter;

const DEFAULT_STATE_FILE: &str = ".storefront-session.json";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Storefront session and API CLI")]
struct Cli {
    #[arg(long, env = "STOREFRONT_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    #[arg(long, env = "STOREFRONT_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "STOREFRONT_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[arg(long, env = "STOREFRONT_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session. Local state is cleared even if the server is unreachable.
    Logout,
    /// Print the current session and storefront flags.
    Whoami,
    Point(PointCommand),
    /// Send an authenticated request and print the JSON response.
    Api {
        method: String,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Args, Debug)]
struct PointCommand {
    #[command(subcommand)]
    command: PointSubcommand,
}

#[derive(Subcommand, Debug)]
enum PointSubcommand {
    /// Select a pickup point given as JSON.
    Set { data: String },
    Show,
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_tracing();
    let cli = Cli::parse();
    let (mut store, api) = build_store(&cli)?;

    match cli.command {
        Command::Login { email, password } => {
            store.login(&Credentials::new(email, password)).await?;
            print_json(&serde_json::to_value(store.snapshot())?)
        }
        Command::Logout => {
            store.logout().await;
            print_json(&serde_json::to_value(store.snapshot())?)
        }
        Command::Whoami => print_json(&serde_json::to_value(store.snapshot())?),
        Command::Point(point) => run_point(&mut store, point),
        Command::Api { method, path, data } => {
            let method = parse_method(&method)?;
            let body = parse_json_arg(data.as_deref())?;
            let json = api.send_json(method, &path, body.as_ref()).await?;
            print_json(&json)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn api_config(cli: &Cli) -> ApiConfig {
    ApiConfig {
        timeouts: ApiTimeouts { request_secs: cli.request_timeout_secs, connect_secs: cli.connect_timeout_secs },
        ..ApiConfig::new(&cli.base_url)
    }
}

fn build_store(cli: &Cli) -> Result<(Store, Arc<ApiClient>), CliError> {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&cli.state_file));
    let api = Arc::new(ApiClient::new(&api_config(cli), storage.clone())?);
    tracing::debug!(base_url = api.base_url(), state_file = %cli.state_file.display(), "client ready");
    Ok((Store::new(api.clone(), storage), api))
}

fn run_point(store: &mut Store, point: PointCommand) -> Result<(), CliError> {
    match point.command {
        PointSubcommand::Set { data } => {
            let value = serde_json::from_str::<Value>(&data)?;
            store.set_selected_point(value);
        }
        PointSubcommand::Show => {}
        PointSubcommand::Clear => store.clear_selected_point(),
    }
    print_json(store.selected_point().unwrap_or(&Value::Null))
}

fn parse_method(raw: &str) -> Result<reqwest::Method, CliError> {
    reqwest::Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(raw.to_owned()))
}

fn parse_json_arg(raw: Option<&str>) -> Result<Option<Value>, CliError> {
    raw.map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(CliError::from)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
