use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use newsdeck::{App, Config, SourceStore};

/// Get the config directory path (~/.config/newsdeck/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdeck"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdeck", about = "Aggregate RSS/Atom news feeds through a proxy")]
struct Args {
    /// Config file (default: ~/.config/newsdeck/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Topic filter key (all, btc, eth, alt, reg, sec)
    #[arg(short = 't', long, default_value = "all")]
    topic: String,

    /// Free-text search over title, snippet, and source name
    #[arg(short = 'q', long, default_value = "")]
    search: String,

    /// Keep running, refreshing on the configured interval
    #[arg(long)]
    watch: bool,

    /// Maximum items to print (overrides config)
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// List sources and their enabled state, then exit
    #[arg(long)]
    list_sources: bool,

    /// Enable a source by id, persist the toggle, and exit
    #[arg(long, value_name = "ID")]
    enable: Option<String>,

    /// Disable a source by id, persist the toggle, and exit
    #[arg(long, value_name = "ID")]
    disable: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let sources_path = config
        .sources_file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir.join("sources.json"));
    let store = SourceStore::new(sources_path);

    let mut app = App::new(&config, store).context("Failed to create application")?;
    app.set_filter(&args.topic);
    app.set_search(&args.search);

    if args.list_sources {
        for source in app.sources() {
            let flag = if source.enabled { "[on] " } else { "[off]" };
            println!("{flag} {:<18} {} — {}", source.id, source.name, source.url);
        }
        return Ok(());
    }

    if let Some(id) = &args.enable {
        app.set_source_enabled(id, true)?;
        println!("Enabled {id}");
        return Ok(());
    }
    if let Some(id) = &args.disable {
        app.set_source_enabled(id, false)?;
        println!("Disabled {id}");
        return Ok(());
    }

    let limit = args.limit.unwrap_or(config.max_display_items);

    run_cycle(&mut app, limit).await;

    if args.watch {
        let interval = Duration::from_secs(config.refresh_interval_minutes.max(1) * 60);
        loop {
            tokio::time::sleep(interval).await;
            run_cycle(&mut app, limit).await;
        }
    }

    Ok(())
}

/// One refresh-and-print cycle. Awaiting the refresh before sleeping
/// again keeps cycles strictly sequential in watch mode.
async fn run_cycle(app: &mut App, limit: usize) {
    app.refresh().await;

    println!("{}", app.state().status);

    let visible = app.visible();
    if visible.is_empty() {
        println!("No matching items. Try the \"all\" topic or clear the search.");
        return;
    }

    for item in visible.iter().take(limit) {
        println!();
        println!("{}  ·  {}", item.published_label(), item.source);
        println!("{}", item.title);
        if !item.snippet.is_empty() {
            println!("  {}", item.snippet);
        }
        println!("  {}", item.link);
    }

    if visible.len() > limit {
        println!();
        println!("({} more not shown)", visible.len() - limit);
    }
}
