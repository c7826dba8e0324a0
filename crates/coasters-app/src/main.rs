// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coasters: interactive roller-coaster catalog browser
//
// Entry point. Initialises logging, resolves configuration, builds the
// repository and models, and runs the prompt loop:
//   <text>   search by name
//   <empty>  list everything
//   <n>      details for entry n of the last listing
//   quit     exit

mod services;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::runtime::Handle;

use coasters_bridge::CatalogService;
use coasters_client::FixtureTransport;
use coasters_core::config::{BridgeMode, CatalogConfig};
use coasters_core::error::Result;
use coasters_core::human_errors::humanize_error;

use services::data_dir;
use services::detail_model::DetailModel;
use services::list_model::ListModel;
use services::repository::RepositoryAdapter;
use state::{DetailState, ListState};

#[derive(Parser, Debug)]
#[command(name = "coasters", version)]
#[command(about = "Browse the roller-coaster catalog")]
struct Cli {
    /// Catalog server base URL, tried before the environment and fallback hosts.
    #[arg(long)]
    base_url: Option<String>,
    /// Serve the catalog from a local JSON file instead of the network.
    #[arg(long)]
    fixture: Option<PathBuf>,
    /// How results cross the service bridge: handles or json.
    #[arg(long)]
    mode: Option<BridgeMode>,
    /// Settings file (defaults to $XDG_CONFIG_HOME/coasters/config.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "coasters exited with an error");
            eprintln!("{}", humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let path = cli.config.clone().unwrap_or_else(data_dir::config_path);
    let mut config = CatalogConfig::load_or_default(&path)?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(mode) = cli.mode {
        config.bridge_mode = mode;
    }
    Ok(config)
}

fn build_repository(cli: &Cli, config: &CatalogConfig) -> Result<RepositoryAdapter> {
    let runtime = Handle::current();
    match &cli.fixture {
        Some(path) => {
            tracing::info!(path = %path.display(), "offline mode: serving catalog from fixture");
            let transport = FixtureTransport::from_file(path)?;
            let service = CatalogService::with_transport(config, Arc::new(transport));
            Ok(RepositoryAdapter::new(service, config.bridge_mode, runtime))
        }
        None => RepositoryAdapter::from_config(config, runtime),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let repo = build_repository(&cli, &config)?;
    tracing::info!(mode = ?repo.mode(), "Coasters starting");

    let list = ListModel::new(repo.clone(), config.search_debounce());
    let detail = DetailModel::new(repo);
    let mut list_rx = list.subscribe();

    list.refresh();
    list.wait_idle().await;
    render_list(&list_rx.borrow_and_update());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Ok(number) = input.parse::<usize>() {
            let slug = list
                .state()
                .items
                .get(number.wrapping_sub(1))
                .map(|c| c.slug.clone());
            match slug {
                Some(slug) => {
                    detail.load(&slug).await;
                    render_detail(&detail.state());
                }
                None => println!("No entry {number} in the last listing."),
            }
            continue;
        }

        if input.is_empty() {
            list.refresh();
        } else {
            list.on_query_change(input);
        }
        list.wait_idle().await;
        render_list(&list_rx.borrow_and_update());
    }

    tracing::info!("Coasters exiting");
    Ok(())
}

async fn prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"\nsearch (empty = all, number = details, quit): ")
        .await?;
    stdout.flush().await?;
    Ok(())
}

fn render_list(state: &ListState) {
    if let Some(error) = &state.error {
        println!("! {error}");
    }
    if state.items.is_empty() {
        println!("No coasters found.");
        return;
    }
    for (i, category) in state.items.iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, category.name, category.construction);
    }
    if let Some(at) = state.refreshed_at {
        println!("    {} results, updated {}", state.items.len(), at.format("%H:%M:%S"));
    }
}

fn render_detail(state: &DetailState) {
    if let Some(error) = &state.error {
        println!("! {error}");
        return;
    }
    let Some(category) = &state.detail else {
        return;
    };
    println!("{}", category.name);
    println!("  slug:         {}", category.slug);
    println!("  construction: {}", category.construction);
    println!("  source:       {}", category.source_url);
    println!("  image:        {}", category.image_url);
    if category.prebuilt_designs.is_empty() {
        println!("  designs:      none");
    } else {
        println!("  designs:");
        for design in &category.prebuilt_designs {
            println!("    - {design}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("coasters").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn flags_overlay_the_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"base_url":"http://file:3000","bridge_mode":"json"}"#,
        )
        .expect("write");
        let path = path.to_str().expect("utf-8 path");

        let from_file = load_config(&cli(&["--config", path])).expect("load");
        assert_eq!(from_file.base_url.as_deref(), Some("http://file:3000"));
        assert_eq!(from_file.bridge_mode, BridgeMode::Json);

        let overridden = load_config(&cli(&[
            "--config",
            path,
            "--base-url",
            "http://flag:3000",
            "--mode",
            "handles",
        ]))
        .expect("load");
        assert_eq!(overridden.base_url.as_deref(), Some("http://flag:3000"));
        assert_eq!(overridden.bridge_mode, BridgeMode::Handles);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let config = load_config(&cli(&["--config", path.to_str().expect("utf-8")])).expect("load");
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["coasters", "--mode", "carrier-pigeon"]).is_err());
    }
}
