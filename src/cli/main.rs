use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoindex::core::telemetry::logging::init_logging;
use autoindex::{list_dir, AutoIndex, AutoIndexConfig, Entry, Listing};
use clap::Parser;

/// Print a directory listing the way an autoindex page would show it.
#[derive(Debug, Parser)]
#[command(name = "autoindex", version)]
struct Cli {
    /// Path relative to the browse root.
    #[arg(default_value = ".")]
    path: String,
    /// Browse root; overrides the config file.
    #[arg(long)]
    root: Option<PathBuf>,
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// name, size, modified or ext; a leading + or - sets the order.
    #[arg(long)]
    sort_by: Option<String>,
    /// asc or desc.
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    show_hidden: bool,
    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AutoIndexConfig::load(path)?,
        None => AutoIndexConfig::default(),
    };
    if let Some(root) = cli.root {
        config.browse_root = root;
    }
    if cli.show_hidden {
        config.show_hidden = true;
    }

    let index = Arc::new(AutoIndex::new(config).context("cannot open browse root")?);
    tracing::info!(root = %index.root().display(), path = %cli.path, "browsing");

    match index.entry(&cli.path)? {
        Entry::File(file) => {
            println!("{}", file.to_html(index.markdown())?);
        }
        Entry::Folder(_) => {
            let options = index.browse_options(cli.sort_by.as_deref(), cli.order.as_deref());
            let listing = list_dir(index.clone(), cli.path.clone(), options).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_table(&listing);
            }
        }
    }
    Ok(())
}

fn print_table(listing: &Listing) {
    println!("Index of /{}", listing.folder.path);
    for entry in &listing.entries {
        let size = entry.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:<7} {:>10}  {}",
            entry.icon, entry.kind, size, entry.name
        );
    }
    if let Some(readme) = &listing.readme {
        println!();
        println!("{readme}");
    }
}
