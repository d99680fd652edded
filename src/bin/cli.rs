//! assumap CLI
//!
//! Scrapes assumable-mortgage listings, exports them to CSV, and optionally
//! renders an interactive map enriched with nearby-school data.

use std::path::PathBuf;
use std::sync::Arc;

use assumap::{
    cache::FileCache,
    error::Result,
    models::{Config, Credentials},
    pipeline::{self, MapBuildOutcome},
    services::{ListingClient, SchoolsClient},
    utils::http::{HttpTransport, Transport},
};
use clap::{Parser, Subcommand};

/// assumap - Assumable Listing Scraper
#[derive(Parser, Debug)]
#[command(name = "assumap", version, about = "Assumable listing scraper and map builder")]
struct Cli {
    /// Path to the cache directory
    #[arg(long, default_value = ".cache")]
    cache_dir: PathBuf,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape all listing pages and export them to CSV
    Scrape {
        /// CSV output filename
        #[arg(long, default_value = "listings.csv")]
        output: PathBuf,

        /// Also generate a map with pins
        #[arg(long)]
        map: bool,

        /// Map output filename
        #[arg(long, default_value = "map.html")]
        map_output: PathBuf,

        /// Disable the schools overlay in the generated map
        #[arg(long)]
        no_schools: bool,
    },

    /// Build the map only (listing pages come from cache when present)
    Map {
        /// Map output filename
        #[arg(long, default_value = "map.html")]
        output: PathBuf,

        /// Disable the schools overlay
        #[arg(long)]
        no_schools: bool,
    },

    /// Validate configuration and report credential presence
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_schools_client(
    no_schools: bool,
    transport: Arc<dyn Transport>,
    cache: FileCache,
    config: &Config,
    creds: &Credentials,
) -> Option<SchoolsClient> {
    if no_schools {
        return None;
    }
    if creds.gs_csrf_token.is_none() || creds.gs_csrf_cookie.is_none() {
        log::warn!(
            "GreatSchools credentials missing; schools overlay may be empty. \
             Set GS_CSRF_TOKEN and GS_COOKIE or use --no-schools."
        );
    }
    Some(SchoolsClient::new(
        transport,
        cache,
        config.schools.clone(),
        creds.gs_csrf_token.clone(),
        creds.gs_csrf_cookie.clone(),
    ))
}

async fn run_map_build(
    listings: &[assumap::models::ListingSummary],
    schools_client: Option<&SchoolsClient>,
    output: &PathBuf,
) -> Result<()> {
    match pipeline::build_map(listings, schools_client, output).await? {
        MapBuildOutcome::Saved { points, schools, file, .. } => {
            log::info!(
                "Map saved to {} ({} listing pins, {} school pins)",
                file.display(),
                points,
                schools
            );
        }
        MapBuildOutcome::Empty => {
            println!("No coordinates found to map.");
        }
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("assumap starting...");

    let mut config = Config::load_or_default(&cli.config);
    let creds = Credentials::from_env();
    if let Some(ua) = &creds.gs_user_agent {
        config.schools.user_agent = ua.clone();
    }
    config.validate()?;

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.crawler)?);
    let cache = FileCache::new(&cli.cache_dir);
    let listing_client =
        ListingClient::new(transport.clone(), cache.clone(), config.listing.clone());
    let cookies = creds.listing_cookies();

    match cli.command {
        Command::Scrape { output, map, map_output, no_schools } => {
            if creds.token.is_empty() {
                log::warn!("ASSUMABLE_TOKEN is not set; listing requests will likely be rejected");
            }

            let outcome = pipeline::collect_listings(
                &listing_client,
                &creds.token,
                &cookies,
                config.crawler.request_delay_ms,
            )
            .await?;

            if outcome.is_empty() {
                println!("No listings found.");
                return Ok(());
            }

            pipeline::write_listings_csv(&outcome.listings, &output)?;
            println!(
                "Saved {} listings from {} pages to {}",
                outcome.listings.len(),
                outcome.total_pages,
                output.display()
            );

            if map {
                let schools_client =
                    build_schools_client(no_schools, transport, cache, &config, &creds);
                run_map_build(&outcome.listings, schools_client.as_ref(), &map_output).await?;
            }
        }

        Command::Map { output, no_schools } => {
            let outcome = pipeline::collect_listings(
                &listing_client,
                &creds.token,
                &cookies,
                config.crawler.request_delay_ms,
            )
            .await?;

            if outcome.is_empty() {
                println!("No listings found.");
                return Ok(());
            }

            let schools_client =
                build_schools_client(no_schools, transport, cache, &config, &creds);
            run_map_build(&outcome.listings, schools_client.as_ref(), &output).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK");
            log::info!(
                "Credentials: assumable token {}, GS csrf token {}, GS cookie {}",
                if creds.token.is_empty() { "missing" } else { "present" },
                if creds.gs_csrf_token.is_some() { "present" } else { "missing" },
                if creds.gs_csrf_cookie.is_some() { "present" } else { "missing" },
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
