//! Download every clip for a date range
//!
//! ```bash
//! cargo run --example date_range -- 2023-04-12 2023-04-12 [TEAM] [PITCH_CALL]
//! ```
//!
//! Set `SAVANT_DL_CONFIG` to a JSON config file to override defaults and
//! `RUST_LOG` to adjust log output.

use savant_dl::{BatchOptions, ClipDownloader, Config, Event, cancel_on_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,savant_dl=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(start), Some(end)) = (args.first(), args.get(1)) else {
        eprintln!("usage: date_range START END [TEAM] [PITCH_CALL]");
        std::process::exit(2);
    };

    let mut config = match std::env::var("SAVANT_DL_CONFIG") {
        Ok(path) => Config::from_json_file(path)?,
        Err(_) => Config::default(),
    };
    if let Some(team) = args.get(2) {
        config.resolve.team = Some(team.clone());
    }
    if let Some(call) = args.get(3) {
        config.resolve.pitch_call = Some(call.clone());
    }

    let downloader = ClipDownloader::new(config)?;
    cancel_on_signal(downloader.cancel_token());

    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::Resolved { items } = event {
                tracing::info!(items, "Work list ready");
            }
        }
    });

    let request = downloader.date_range_request(start, end)?;
    let options = BatchOptions::from_config(&downloader.get_config());
    let report = downloader.run_date_range(&request, &options).await?;

    println!(
        "{} downloaded, {} without video, {} failed",
        report.succeeded(),
        report.not_found(),
        report.failed()
    );
    Ok(())
}
