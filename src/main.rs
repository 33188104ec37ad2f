use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use cadence::config::Config;
use cadence::curation::{CurationEngine, CurationSession, FilterSpec};
use cadence::errors::AppError;
use cadence::metadata::MetadataEnricher;
use cadence::models::SourceCollection;
use cadence::providers::StreamingService;
use cadence::spotify::{SpotifyClient, SpotifyProvider};
use cadence::store::{seed_demo_tracks, StoreManager};

#[derive(Debug, Default)]
struct CliArgs {
    /// JSON filter specification; defaults to a wide-open demo search.
    filter_path: Option<PathBuf>,
    /// Publish the assembled playlist under this name.
    publish: Option<String>,
    public: bool,
    /// Seed the sampler for reproducible runs.
    seed: Option<u64>,
    /// Run metadata enrichment on the source collection first.
    enrich: bool,
}

fn print_usage() {
    println!(
        "Usage: cadence [FILTER_JSON] [options]\n\n\
         Options:\n\
         \x20 --publish <name>   publish the playlist to the streaming service\n\
         \x20 --public           make the published playlist public\n\
         \x20 --seed <n>         seed the selection sampler\n\
         \x20 --enrich           fetch missing feature vectors before searching\n\
         \x20 -h, --help         show this help"
    );
}

fn parse_args() -> Result<CliArgs, AppError> {
    let mut cli = CliArgs::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--publish" => {
                cli.publish = Some(args.next().ok_or_else(|| {
                    AppError::Config("--publish requires a playlist name".to_string())
                })?);
            }
            "--public" => cli.public = true,
            "--seed" => {
                let value = args
                    .next()
                    .ok_or_else(|| AppError::Config("--seed requires a number".to_string()))?;
                cli.seed = Some(value.parse().map_err(|_| {
                    AppError::Config(format!("invalid seed value: {}", value))
                })?);
            }
            "--enrich" => cli.enrich = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other if !other.starts_with('-') => cli.filter_path = Some(PathBuf::from(other)),
            other => {
                return Err(AppError::Config(format!("unknown option: {}", other)));
            }
        }
    }

    Ok(cli)
}

async fn run() -> Result<(), AppError> {
    let cli = parse_args()?;
    let config = Config::from_env()?;

    let store = StoreManager::open(&config.data_dir).await?.tracks();

    let seeded = seed_demo_tracks(&store).await?;
    if seeded > 0 {
        log::info!("Seeded demo collection with {} tracks", seeded);
    }

    let client = SpotifyClient::new(config.spotify.clone());
    let service: Arc<dyn StreamingService> = Arc::new(SpotifyProvider::new(client));

    let engine = match cli.seed {
        Some(seed) => CurationEngine::with_seed(store.clone(), service, seed),
        None => CurationEngine::new(store.clone(), service),
    };

    let spec: FilterSpec = match &cli.filter_path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => {
            log::info!("No filter given; running a wide-open demo search");
            FilterSpec::any(SourceCollection::DemoTracks, 10)
        }
    };

    if cli.enrich {
        match MetadataEnricher::new()
            .enrich_collection(&store, spec.source)
            .await
        {
            Ok(updated) => log::info!("Enrichment updated {} tracks", updated),
            Err(e) => log::warn!("Enrichment failed: {}; searching with what we have", e),
        }
    }

    let mut session = CurationSession::new();
    let outcome = engine.run_search(&mut session, &spec).await?;

    if outcome.no_matches() {
        println!("No matching tracks found. Loosen the filter and search again.");
        return Ok(());
    }

    println!(
        "\nPlaylist ({} tracks, {} total matches):",
        outcome.playlist_len, outcome.total_matches
    );
    for (i, track) in session.playlist.iter().enumerate() {
        let saved = match track.saved {
            Some(true) => " [saved]",
            _ => "",
        };
        println!("{:>3}. {} - {}{}", i + 1, track.artists, track.name, saved);
    }

    if !session.pool.is_empty() {
        println!("\nMore matches:");
        for track in session.pool.iter().take(10) {
            println!("     {} - {}", track.artists, track.name);
        }
        if session.pool.len() > 10 {
            println!("     ... and {} more", session.pool.len() - 10);
        }
    }

    if !outcome.synced {
        println!("\nNote: saved-status sync was skipped or failed; flags may be stale.");
    }

    if let Some(name) = cli.publish {
        let playlist_id = engine
            .publish(&session, &name, "Curated with cadence", cli.public)
            .await?;
        println!("\nPublished as playlist {}", playlist_id);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
