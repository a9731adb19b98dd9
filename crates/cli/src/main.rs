// ABOUTME: CLI binary for the harvest blog extraction pipeline.
// ABOUTME: Crawls listings into a JSON store, extracts local HTML files, and lists or shows stored articles.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use harvest_core::{
    extract_article, ArticleStore, Crawler, ListingEntry, MemoryStore, OutputFormat, SiteProfile,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Extract clean article content from paginated blogs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the listing and extract up to COUNT articles
    Crawl(CrawlArgs),
    /// Run the extraction pipeline on a local HTML file
    Extract(ExtractArgs),
    /// List stored articles, newest first
    List {
        #[arg(long, env = "HARVEST_STORE")]
        store: PathBuf,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one stored article
    Show {
        #[arg(long, env = "HARVEST_STORE")]
        store: PathBuf,
        id: String,
        /// Output format: html (default), markdown/md, text/txt
        #[arg(short = 'f', long = "format", default_value = "html")]
        format: String,
        /// Print the extracted body even when a rewrite exists
        #[arg(long)]
        original: bool,
    },
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Number of articles to collect
    #[arg(short = 'n', long, default_value_t = 5, env = "HARVEST_COUNT")]
    count: usize,
    /// First listing page (overrides the profile)
    #[arg(long, env = "HARVEST_BASE_URL")]
    base_url: Option<String>,
    /// Site profile JSON file (default: the beyondchats profile)
    #[arg(long, env = "HARVEST_PROFILE")]
    profile: Option<PathBuf>,
    /// JSON store to upsert articles into
    #[arg(long, env = "HARVEST_STORE")]
    store: Option<PathBuf>,
    /// Per-fetch timeout in seconds
    #[arg(long, default_value_t = 15, env = "HARVEST_TIMEOUT_SECS")]
    timeout_secs: u64,
    /// Article pages fetched at once
    #[arg(long, default_value_t = 4, env = "HARVEST_CONCURRENCY")]
    concurrency: usize,
    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,
    /// Print articles as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// HTML file to extract
    #[arg(long)]
    html: PathBuf,
    /// Source URL of the page
    #[arg(long)]
    url: String,
    /// Title to use instead of the page's h1
    #[arg(long)]
    title: Option<String>,
    /// Site profile JSON file (default: the beyondchats profile)
    #[arg(long, env = "HARVEST_PROFILE")]
    profile: Option<PathBuf>,
    /// Output format: html (default), markdown/md, text/txt
    #[arg(short = 'f', long = "format", default_value = "html")]
    format: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_profile(path: Option<&Path>) -> Result<SiteProfile> {
    let profile = match path {
        Some(path) => SiteProfile::from_json_file(path)?,
        None => SiteProfile::default(),
    };
    Ok(profile)
}

async fn crawl(args: CrawlArgs) -> Result<()> {
    let mut builder = Crawler::builder()
        .profile(load_profile(args.profile.as_deref())?)
        .timeout(Duration::from_secs(args.timeout_secs))
        .concurrency(args.concurrency)
        .allow_private_networks(args.allow_private_networks);
    if let Some(base_url) = args.base_url {
        builder = builder.base_url(base_url);
    }
    let crawler = builder.build()?;

    match args.store {
        Some(path) => {
            let mut store = MemoryStore::open(&path)?;
            let records = crawler.crawl_into(args.count, &mut store).await?;
            store.save()?;
            info!(stored = records.len(), path = %path.display(), "saved store");
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!("{}\t{}\t{}", record.id, record.slug, record.title);
                }
            }
        }
        None => {
            let articles = crawler.crawl(args.count).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&articles)?);
            } else {
                for article in &articles {
                    println!("{}\t{}", article.slug, article.title);
                }
            }
        }
    }
    Ok(())
}

fn extract(args: ExtractArgs) -> Result<()> {
    let markup = fs::read_to_string(&args.html)
        .with_context(|| format!("reading {}", args.html.display()))?;
    let profile = load_profile(args.profile.as_deref())?;
    let entry = ListingEntry {
        title: args.title.map(|t| t.trim().to_string()).unwrap_or_default(),
        url: args.url,
    };
    let article = extract_article(&markup, &entry, &profile)?;
    println!("{}", OutputFormat::from(args.format.as_str()).render(&article.content));
    Ok(())
}

fn list(store: &Path, json: bool) -> Result<()> {
    let store = MemoryStore::open(store)?;
    let records = store.find_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for record in &records {
        let state = if record.is_updated { "updated" } else { "original" };
        println!(
            "{}\t{}\t{}\t{}",
            record.id, state, record.published_date, record.title
        );
    }
    Ok(())
}

fn show(store: &Path, id: &str, format: &str, original: bool) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("invalid article id {:?}", id))?;
    let record = MemoryStore::open(store)?.find_by_id(id)?;
    let body = if original {
        record.content.as_str()
    } else {
        record.display_content()
    };
    println!("{}", OutputFormat::from(format).render(body));
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Extract(args) => extract(args),
        Command::List { store, json } => list(&store, json),
        Command::Show {
            store,
            id,
            format,
            original,
        } => show(&store, &id, &format, original),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
