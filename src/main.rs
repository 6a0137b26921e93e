//! Forge - batch media conversion queue
//!
//! Scans the given files and folders, queues every supported input and
//! prints the resulting queue.

use anyhow::Result;
use clap::Parser;
use forge::queue::QueueSnapshot;
use forge::utils::friendly_ext;
use forge::{app, AppSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forge", version, about = "Queue media files for conversion")]
struct Args {
    /// Files or folders to queue
    paths: Vec<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Only scan the top level of folders
    #[arg(long)]
    no_recursive: bool,

    /// Print the queue as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings_path = args.settings.unwrap_or_else(AppSettings::default_path);
    let mut settings = AppSettings::load_or_default(&settings_path);
    if args.no_recursive {
        settings.recursive_scan = false;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(app::run(settings, args.paths))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_queue(&snapshot);
    }

    Ok(())
}

fn print_queue(snapshot: &QueueSnapshot) {
    for (i, entry) in snapshot.entries.iter().enumerate() {
        let marker = if snapshot.selected_index == Some(i) { ">" } else { " " };
        println!(
            "{} {:>3}  {:<8} {:<4} {:>10}  {:>8}  {}",
            marker,
            i,
            entry.status,
            friendly_ext(&entry.path),
            entry.size_label,
            entry.duration_label,
            entry.name
        );
    }

    let summary = snapshot.summary();
    println!("{}", summary);
}
