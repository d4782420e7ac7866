use clap::{Args, Parser, Subcommand};
use community_scraper::config::{Settings, SiteConfig};
use community_scraper::db::scrapes::{end_scrape_run, get_recent_scrapes, start_scrape_run};
use community_scraper::db::{init_db, Database, SqliteStore};
use community_scraper::engine::{
    filter_valid_links, harvest_links, run_batch, ArchivingFetcher, HttpFetcher, ListingAssembler,
};
use community_scraper::engine::ListingRecord;
use community_scraper::store::{JsonDirStore, JsonLinkStore, LinkStore};
use community_scraper::{ScraperError, TracingSink};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str =
    "https://www.pulte.com/homes/nevada/las-vegas/las-vegas/monument-at-reverence-211219";

const LINKS_FILE: &str = "pulte_links.json";

#[derive(Parser)]
#[command(name = "community_scraper", about = "Scrape new-home community listings")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SettingsArgs {
    /// Root directory for json/ and html/ artifacts
    #[arg(long, env = "SCRAPER_OUTPUT_DIR", default_value = "data/pulte", global = true)]
    output_dir: PathBuf,

    /// Render pages through ZenRows when set
    #[arg(long, env = "ZENROWS_API_KEY", hide_env_values = true, global = true)]
    zenrows_api_key: Option<String>,

    /// How long the renderer waits for scripts, in milliseconds
    #[arg(long, env = "SCRAPER_RENDER_WAIT_MS", default_value_t = 5000, global = true)]
    render_wait_ms: u64,

    /// Pause between listing pages, in seconds
    #[arg(long, env = "SCRAPER_PAGE_DELAY_SECS", default_value_t = 2, global = true)]
    page_delay_secs: u64,

    /// Store records in this SQLite file instead of JSON files
    #[arg(long, env = "SCRAPER_DB_PATH", global = true)]
    db_path: Option<PathBuf>,
}

impl From<SettingsArgs> for Settings {
    fn from(args: SettingsArgs) -> Self {
        Settings {
            output_dir: args.output_dir,
            zenrows_api_key: args.zenrows_api_key,
            render_wait: Duration::from_millis(args.render_wait_ms),
            page_delay: Duration::from_secs(args.page_delay_secs),
            db_path: args.db_path,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the site for community links and save them
    Discover {
        #[arg(long, default_value = LINKS_FILE)]
        links: PathBuf,
    },
    /// Drop saved links that are not leaf listings
    Filter {
        #[arg(long, default_value = LINKS_FILE)]
        links: PathBuf,
    },
    /// Scrape one listing, or every saved link with --batch
    Scrape {
        #[arg(long, conflicts_with = "batch")]
        url: Option<String>,
        #[arg(long)]
        batch: bool,
    },
    /// Print a stored listing record
    Show {
        /// Listing key, the last path segment of its URL
        key: String,
    },
    /// List recent batch runs from the SQLite store
    Runs,
}

fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from(cli.settings);
    let site = SiteConfig::pulte();

    if let Err(e) = run(cli.command, &settings, &site) {
        error!(error = %e, "run failed");
        std::process::exit(1);
    }
}

fn http_fetcher(
    settings: &Settings,
    site: &SiteConfig,
) -> Result<ArchivingFetcher<HttpFetcher>, ScraperError> {
    Ok(ArchivingFetcher::new(
        HttpFetcher::new(settings.zenrows_api_key.clone(), settings.render_wait)?,
        settings.html_dir(),
        site.artifact_prefix.clone(),
    ))
}

fn run(command: Command, settings: &Settings, site: &SiteConfig) -> Result<(), ScraperError> {
    let sink = TracingSink;

    match command {
        Command::Discover { links } => {
            let found = harvest_links(&http_fetcher(settings, site)?, site, &sink)?;
            JsonLinkStore::new(links).save(&found)?;
        }
        Command::Filter { links } => {
            let store = JsonLinkStore::new(links);
            let all = store.load()?;
            let kept = filter_valid_links(&all);
            info!(before = all.len(), after = kept.len(), "links filtered");
            store.save(&kept)?;
        }
        Command::Scrape { url, batch } => {
            let urls = if batch {
                batch_urls(settings)?
            } else {
                vec![url.unwrap_or_else(|| DEFAULT_URL.to_string())]
            };
            if urls.is_empty() {
                return Err(ScraperError::Config("no URLs to process".into()));
            }
            info!(count = urls.len(), "URLs to process");

            let fetcher = http_fetcher(settings, site)?;
            let assembler = ListingAssembler::new(site, &fetcher, &sink);
            match &settings.db_path {
                Some(path) => {
                    let db = Database::new(path);
                    init_db(&db)?;
                    let store = SqliteStore::new(db.clone());
                    let run_id = db.with_conn(|conn| start_scrape_run(conn, &site.artifact_prefix, now_unix()))?;
                    let summary = run_batch(&assembler, &urls, &store, settings.page_delay);
                    db.with_conn(|conn| end_scrape_run(conn, run_id, now_unix(), urls.len(), &summary))?;
                }
                None => {
                    let store = JsonDirStore::new(settings.json_dir(), site.artifact_prefix.clone());
                    run_batch(&assembler, &urls, &store, settings.page_delay);
                }
            }
        }
        Command::Show { key } => show(&key, settings, site)?,
        Command::Runs => runs(settings)?,
    }

    Ok(())
}

fn show(key: &str, settings: &Settings, site: &SiteConfig) -> Result<(), ScraperError> {
    let record: ListingRecord = match &settings.db_path {
        Some(path) => {
            let db = Database::new(path);
            init_db(&db)?;
            SqliteStore::new(db)
                .load(key)?
                .ok_or_else(|| ScraperError::Config(format!("no stored listing '{key}'")))?
        }
        None => JsonDirStore::new(settings.json_dir(), site.artifact_prefix.clone()).read(key)?,
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn runs(settings: &Settings) -> Result<(), ScraperError> {
    let path = settings
        .db_path
        .as_ref()
        .ok_or_else(|| ScraperError::Config("runs needs --db-path".into()))?;
    let db = Database::new(path);
    init_db(&db)?;

    let stored = SqliteStore::new(db.clone()).count()?;
    println!("{stored} listings stored");
    for run in db.with_conn(|conn| get_recent_scrapes(conn))? {
        println!(
            "#{} {} started={} finished={} total={} processed={} skipped={} failed={} success={}",
            run.id,
            run.source,
            run.started_at,
            run.finished_at.map_or("-".into(), |t| t.to_string()),
            run.listings_total.unwrap_or(0),
            run.processed.unwrap_or(0),
            run.skipped.unwrap_or(0),
            run.failed.unwrap_or(0),
            run.success,
        );
    }
    Ok(())
}

fn batch_urls(settings: &Settings) -> Result<Vec<String>, ScraperError> {
    let candidates = [
        PathBuf::from(LINKS_FILE),
        PathBuf::from("data").join(LINKS_FILE),
        settings.output_dir.join(LINKS_FILE),
    ];
    let store = JsonLinkStore::locate(&candidates)
        .ok_or_else(|| ScraperError::Config(format!("{LINKS_FILE} not found")))?;
    store.load()
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use community_scraper::store::OutputStore;

    fn settings(name: &str, db: bool) -> Settings {
        let dir = std::env::temp_dir().join(format!(
            "{name}_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        Settings {
            db_path: db.then(|| dir.join("scraper.sqlite")),
            output_dir: dir,
            zenrows_api_key: None,
            render_wait: Duration::ZERO,
            page_delay: Duration::ZERO,
        }
    }

    #[test]
    fn show_reads_from_the_configured_store() {
        let site = SiteConfig::pulte();
        let json = settings("show_json", false);
        JsonDirStore::new(json.json_dir(), site.artifact_prefix.clone())
            .write(
                "x-1",
                &ListingRecord::new("https://www.pulte.com/homes/x-1", Local::now().naive_local()),
            )
            .unwrap();
        assert!(show("x-1", &json, &site).is_ok());
        assert!(show("missing-2", &json, &site).is_err());

        let sqlite = settings("show_sqlite", true);
        std::fs::create_dir_all(&sqlite.output_dir).unwrap();
        let db = Database::new(sqlite.db_path.as_ref().unwrap());
        init_db(&db).unwrap();
        assert!(matches!(show("x-1", &sqlite, &site), Err(ScraperError::Config(_))));
    }

    #[test]
    fn runs_needs_a_database() {
        assert!(matches!(runs(&settings("runs_json", false)), Err(ScraperError::Config(_))));

        let sqlite = settings("runs_sqlite", true);
        std::fs::create_dir_all(&sqlite.output_dir).unwrap();
        assert!(runs(&sqlite).is_ok());
    }
}
