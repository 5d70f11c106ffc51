//! torlist: CLI tool for downloading and querying Tor node lists.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, UNIX_EPOCH};
use torlist::source::MIN_POLL_INTERVAL;
use torlist::{cache, Config, FetchMode, HttpFetcher, LiveStore, Refresher, TorChecker};

#[derive(Parser)]
#[command(name = "torlist")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Download and query lists of Tor node IP addresses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the lists once and write the cache file
    Fetch {
        /// Which nodes to list: exit-nodes-only or all-nodes
        #[arg(short, long, default_value = "exit-nodes-only")]
        mode: String,

        /// Output cache file
        #[arg(short, long)]
        output: PathBuf,

        /// Request timeout in seconds
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,
    },

    /// Check addresses against a cache file
    Check {
        /// Cache file to read
        #[arg(short, long)]
        cache: PathBuf,

        /// Addresses to check
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Show cache file size and last update time
    Status {
        /// Cache file to inspect
        #[arg(short, long)]
        cache: PathBuf,
    },

    /// Run a checker from a YAML config and log the list size periodically
    Watch {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            mode,
            output,
            timeout,
        } => fetch(&mode, output, timeout),
        Commands::Check { cache, ips } => check(&cache, &ips),
        Commands::Status { cache } => status(&cache),
        Commands::Watch { config } => watch(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn fetch(mode: &str, output: PathBuf, timeout: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mode: FetchMode = mode.parse()?;
    if !mode.uses_network() {
        return Err(format!("mode {} does not download", mode).into());
    }

    let store = Arc::new(LiveStore::new());
    let refresher = Refresher::new(
        Arc::clone(&store),
        Arc::new(HttpFetcher::with_timeout(Duration::from_secs(timeout))),
        mode.sources(),
        Some(output.clone()),
        MIN_POLL_INTERVAL,
    );

    let outcome = refresher.refresh_once();
    if outcome.fallback {
        return Err(format!("download failed for: {}", outcome.failed.join(", ")).into());
    }

    println!("Wrote {} addresses to {:?}", store.len(), output);
    Ok(())
}

fn check(cache_file: &Path, ips: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (set, found) = cache::read(Some(cache_file));
    if !found {
        return Err(format!("cannot read cache file {:?}", cache_file).into());
    }

    let checker = TorChecker::from_set(set);
    for ip in ips {
        let verdict = if checker.is_tor(ip) { "TOR" } else { "not-tor" };
        println!("{}\t{}", ip, verdict);
    }
    Ok(())
}

fn status(cache_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (set, found) = cache::read(Some(cache_file));
    if !found {
        return Err(format!("cannot read cache file {:?}", cache_file).into());
    }

    println!("Cache file: {:?}", cache_file);
    println!("Addresses: {}", set.len());

    match cache::read_metadata(Some(cache_file)).and_then(|m| m.last_updated) {
        Some(time) => {
            let secs = time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
            let age = time.elapsed().unwrap_or_default().as_secs();
            println!("Last updated: {} (unix), {}s ago", secs, age);
        }
        None => println!("Last updated: unknown"),
    }
    Ok(())
}

fn watch(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    let checker = TorChecker::init(&config)?;

    log::info!(
        "Watching Tor list: mode {}, {} addresses",
        checker.mode(),
        checker.len()
    );

    if config.mode == FetchMode::Disabled {
        return Ok(());
    }

    loop {
        thread::sleep(config.refresh_interval());
        log::info!("Tor list holds {} addresses", checker.len());
    }
}
