//! Download the clips listed in a CSV play sheet
//!
//! ```bash
//! cargo run --example from_sheet -- plays.csv [WORKERS]
//! ```
//!
//! The sheet needs `playId` and `game_pk` columns.

use savant_dl::{BatchOptions, ClipDownloader, Config, DownloadOutcome, cancel_on_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,savant_dl=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(sheet) = args.next() else {
        eprintln!("usage: from_sheet SHEET.csv [WORKERS]");
        std::process::exit(2);
    };

    let config = Config::default();
    let mut options = BatchOptions::from_config(&config);
    if let Some(workers) = args.next() {
        options.workers = workers.parse()?;
    }

    let downloader = ClipDownloader::new(config)?;
    cancel_on_signal(downloader.cancel_token());

    let report = downloader.run_from_file(&sheet, &options).await?;
    for (item, outcome) in report.entries() {
        if let DownloadOutcome::Failed { reason } = outcome {
            println!("{item}: {reason}");
        }
    }
    println!(
        "{} of {} clips written to {}",
        report.succeeded(),
        report.len(),
        options.download_dir.display()
    );
    Ok(())
}
