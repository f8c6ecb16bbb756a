use clap::{Parser, Subcommand};
use exn::ResultExt;
use lectio::error::{ErrorKind, Result};
use lectio::{Config, ServiceStats, VerseService};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lectio", version)]
#[command(about = "Serve every verse once before any repeats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "LECTIO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read persisted state but never write it
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the next batch of verses
    Next {
        /// Verses in the batch (defaults to `distribution.batch_size`)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Show cache and distribution statistics
    Stats,
    /// Discard distribution progress and start a fresh cycle
    Reset,
    /// Drop every cached verse
    ClearCache,
    /// Check connectivity, storage and bundled fallbacks
    Health,
    /// Clear the cache and preload popular verses
    Repair,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if cli.dry_run {
        config.storage.read_only = true;
    }
    tracing::debug!(path = %config.storage.path.display(), read_only = config.storage.read_only, "Opening store");
    let service = VerseService::from_config(&config)?;

    match cli.command {
        Command::Next { count } => {
            let count = count.unwrap_or(service.batch_size());
            for verse in service.get_next_batch(count).await? {
                println!("{} ({})", verse.reference, verse.source.label());
                println!("  {}", verse.text);
            }
        },
        Command::Stats => print_stats(&service.get_stats().await),
        Command::Reset => {
            let stats = service.reset_distribution().await;
            println!("Distribution reset: {} verses in cycle {}", stats.total, stats.cycle_count);
        },
        Command::ClearCache => {
            service.clear_cache().await?;
            println!("Cache cleared");
        },
        Command::Health => print!("{}", service.health().await),
        Command::Repair => print!("{}", service.repair().await),
    }
    Ok(())
}

fn print_stats(stats: &ServiceStats) {
    let distribution = &stats.distribution;
    println!("Distribution");
    println!("  cycle:      {}", distribution.cycle_count);
    println!(
        "  progress:   {}/{} ({:.2}%)",
        distribution.used, distribution.total, distribution.progress_percent
    );
    println!("  remaining:  {}", distribution.remaining);
    println!("  created:    {}", distribution.created_at);
    println!("  last reset: {}", distribution.last_reset_at);

    let cache = &stats.cache;
    println!("Cache");
    println!("  entries:    {} ({} live)", cache.entry_count, cache.live_count);
    println!("  bound:      {}", cache.max_entries);
    println!("  ttl:        {} days", cache.ttl_days);
    println!("  size:       {} bytes", cache.approx_size_bytes);
}
