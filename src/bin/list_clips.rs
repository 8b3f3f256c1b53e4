use clap::Parser;
use clip_catalog::{
    config::Config,
    fallback::StorageClient,
    loader::{clips, ClipLoader, LoadOutcome},
};
use tracing_subscriber::EnvFilter;

/// Load clips from a running catalog, the way the clip page does
#[derive(Parser, Debug)]
#[command(name = "list-clips")]
struct Args {
    /// Catalog base URL (defaults to CLIP_API_BASE_URL or config.toml)
    #[arg(long)]
    api_url: Option<String>,

    /// Storage service base URL used for the fallback overlay
    #[arg(long)]
    storage_url: Option<String>,

    /// Print the merged records instead of clip cards
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let api_url = args.api_url.unwrap_or(config.api_base_url);
    let storage = args
        .storage_url
        .or(config.storage.base_url)
        .map(|url| StorageClient::new(http.clone(), &url, config.storage.purpose.clone()));

    let loader = ClipLoader::new(http, &api_url, storage);
    let outcome = loader.load().await;

    if let Some(alert) = outcome.alert_message() {
        eprintln!("{}", alert);
        std::process::exit(1);
    }

    let output = match &outcome {
        LoadOutcome::Loaded(collection) | LoadOutcome::Fallback(collection) if args.raw => {
            serde_json::to_string_pretty(collection)?
        }
        LoadOutcome::Loaded(collection) | LoadOutcome::Fallback(collection) => {
            serde_json::to_string_pretty(&clips(collection))?
        }
        _ => "[]".to_string(),
    };
    println!("{}", output);

    Ok(())
}
