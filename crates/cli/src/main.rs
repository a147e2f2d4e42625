use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use datasets_api::{ApiConfig, ConfigOverrides, DatasetsClient};
use datasets_mcp::{DatasetsMcpCore, serve_stdio};
use datasets_registry::OperationRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("operations", sub)) => print_operations(sub.get_flag("json")),
        // No subcommand => serve
        _ => run_server(&matches).await,
    }
}

// stdout carries the protocol stream, so logs go to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn build_cli() -> Command {
    Command::new("datasets-mcp-server")
        .about("MCP server exposing the NCBI Datasets API over stdio")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .action(ArgAction::Set)
                .help("Upstream base address (overrides NCBI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(value_parser!(u64))
                .help("Upstream request timeout in milliseconds (overrides NCBI_TIMEOUT)"),
        )
        .subcommand(Command::new("serve").about("Serve MCP over stdin/stdout (default)"))
        .subcommand(
            Command::new("operations").about("List the published operations").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print names, descriptions and input schemas as JSON"),
            ),
        )
}

fn overrides_from(matches: &ArgMatches) -> ConfigOverrides {
    let scoped = match matches.subcommand() {
        Some(("serve", sub)) => sub,
        _ => matches,
    };
    ConfigOverrides {
        base_url: scoped.get_one::<String>("base-url").cloned(),
        timeout_ms: scoped.get_one::<u64>("timeout-ms").copied(),
    }
}

async fn run_server(matches: &ArgMatches) -> Result<()> {
    let config = ApiConfig::resolve(&overrides_from(matches)).context("invalid upstream configuration")?;
    info!(
        base_url = %config.base_url,
        timeout_ms = config.timeout_ms() as u64,
        api_key = config.api_key.is_some(),
        "starting NCBI Datasets MCP server"
    );
    let client = DatasetsClient::new(Arc::new(config)).context("failed to build upstream client")?;
    serve_stdio(DatasetsMcpCore::new(Arc::new(client))).await
}

fn print_operations(as_json: bool) -> Result<()> {
    let registry = OperationRegistry::builtin();
    if as_json {
        let listing = registry
            .iter()
            .map(|descriptor| {
                serde_json::json!({
                    "name": descriptor.name,
                    "title": descriptor.title,
                    "description": descriptor.description,
                    "category": descriptor.envelope.category(),
                    "input_schema": descriptor.schema.to_json_schema(),
                })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for descriptor in registry.iter() {
        println!("{:<30} {}", descriptor.name, descriptor.description);
    }
    Ok(())
}
