mod api;
mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;

use anyhow::Context;
use api::AppState;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::ProviderSet;
use logic::QueryOrchestrator;
use models::QueryRequest;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match Config::load(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("See config/config.yaml.example for the expected layout");
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Query {
            text,
            lat,
            lon,
            multi,
        } => run_query(&config, text, lat.zip(lon), multi).await,
        Commands::Check => check(&config).await,
    }
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let orchestrator = QueryOrchestrator::from_config(&config)?;
    let state = Arc::new(AppState::new(orchestrator));
    let app = api::build_app(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.server.cors_origins.join(", "));

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn run_query(
    config: &Config,
    text: String,
    hint: Option<(f64, f64)>,
    multi: bool,
) -> anyhow::Result<()> {
    let mut request = QueryRequest::new(text);
    if let Some((lat, lon)) = hint {
        request = request.with_coordinates(lat, lon);
    }
    let query = request.validate()?;
    let orchestrator = QueryOrchestrator::from_config(config)?;

    if multi {
        let outcome = orchestrator.handle_detailed(&query).await;
        println!("{}", serde_json::to_string_pretty(&outcome.responses)?);
        if !outcome.omitted.is_empty() {
            eprintln!("No data for: {}", outcome.omitted.join(", "));
        }
        return Ok(());
    }

    let response = orchestrator.respond(&query).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.fused_data.data_sources.is_empty() {
        eprintln!("{}", response.guidance_text);
    }
    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    println!("Configuration OK");

    let providers = ProviderSet::from_config(&config.providers)?;
    println!(
        "Region catalog: {} regions, market book: {} crops",
        providers.catalog.regions().len(),
        providers.market.entries().len()
    );

    let mut all_connected = true;
    for (name, connected) in providers.check_connections().await {
        println!("{}: {}", name, if connected { "OK" } else { "OFFLINE" });
        all_connected &= connected;
    }

    let orchestrator = QueryOrchestrator::new(&providers, config.providers.timeout());
    println!(
        "{} intent rules, {} crop scoring rules",
        orchestrator.classifier().list_rules().len(),
        orchestrator.engine().list_rules().len()
    );

    if !all_connected {
        println!("Some providers are offline; affected readings will be reported as missing");
    }
    Ok(())
}
