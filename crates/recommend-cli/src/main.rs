mod config;
mod error;
mod interactive;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use recommend_common::client::RecommendClient;
use recommend_common::evaluate::{evaluate, load_labelled_queries};
use recommend_common::panel::{QueryPanel, RequestState};

use config::Config;
use render::{render_metrics, render_results_json, render_samples, render_view};

/// Assessment recommendations for hiring queries.
#[derive(Parser)]
#[command(name = "recommend", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides RECOMMEND_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive query panel (default)
    Panel,
    /// Submit a single query and print the ranked recommendations
    Ask {
        /// Hiring query text
        query: String,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the backend is up
    Health,
    /// List the sample queries
    Samples,
    /// Score the backend against a labelled CSV (Recall@K, Precision@K, MAP)
    Evaluate {
        /// CSV with a `query` (or `csvquery`) column and an `Assessment_url` column
        #[arg(long)]
        train_csv: PathBuf,

        /// Cutoff for Recall@K and Precision@K
        #[arg(long, default_value = "10")]
        k: usize,

        /// Where to write the metrics JSON
        #[arg(long, default_value = "evaluation_metrics.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the panel and results; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?.with_api_url(cli.api_url.as_deref())?;
    info!(api_url = %config.api_url(), "configuration loaded");

    let client = RecommendClient::new(config.client.clone())?;

    match cli.command.unwrap_or(Commands::Panel) {
        Commands::Panel => {
            let panel = Arc::new(QueryPanel::new(client, config.api_url()));
            interactive::run(panel).await?;
        }
        Commands::Ask { query, json } => {
            let panel = QueryPanel::new(client, config.api_url());
            panel.set_query(query);
            panel.submit().await;
            let view = panel.view();
            match render_results_json(&view)? {
                Some(body) if json => println!("{body}"),
                _ => print!("{}", render_view(&view)),
            }
            if view.state() == RequestState::Error {
                std::process::exit(1);
            }
        }
        Commands::Health => {
            let health = client.health(config.api_url()).await?;
            println!("{}: {}", health.status, health.message);
        }
        Commands::Samples => print!("{}", render_samples()),
        Commands::Evaluate {
            train_csv,
            k,
            output,
        } => {
            let queries = load_labelled_queries(&train_csv)?;
            println!("Found {} unique queries", queries.len());

            let report = evaluate(&client, config.api_url(), queries, k).await;
            print!("{}", render_metrics(&report.metrics));

            std::fs::write(&output, serde_json::to_string_pretty(&report.metrics)?)?;
            println!("Metrics saved to {}", output.display());
        }
    }

    Ok(())
}
