use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use wikirace::config::{self, FailurePolicy};
use wikirace::filter::{BoringFilter, WIKIPEDIA_BORING_PATTERNS, WIKIPEDIA_BORING_TITLES};
use wikirace::fixture::FixtureGraph;
use wikirace::links::LinkSource;
use wikirace::provider::{LinkProvider, WikipediaProvider};
use wikirace::stats::SearchStats;
use wikirace::{Direction, SearchCoordinator, SearchOptions};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikirace")]
#[command(about = "Find a chain of links between two Wikipedia articles")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a chain of links from one article to another
    Race(RaceArgs),
    /// Print the links the search would follow from the given articles
    Links(LinksArgs),
}

#[derive(Args)]
struct RaceArgs {
    /// Title of the starting article
    from: String,

    /// Title of the destination article
    to: String,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args)]
struct LinksArgs {
    /// Article titles to look up
    #[arg(required = true)]
    titles: Vec<String>,

    /// Show pages linking to the titles instead of links on them
    #[arg(long)]
    inbound: bool,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args)]
struct SourceArgs {
    /// Serve links from a JSON adjacency file instead of Wikipedia
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Links per response when serving a fixture
    #[arg(long, default_value_t = config::DEFAULT_FIXTURE_PAGE_SIZE)]
    page_size: usize,

    /// MediaWiki API endpoint
    #[arg(long, default_value = config::DEFAULT_API_ENDPOINT)]
    endpoint: String,

    /// User-Agent sent to the API
    #[arg(long, default_value = config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Titles per API request (at most 50)
    #[arg(long, default_value_t = config::MAX_BATCH_SIZE)]
    batch_size: usize,

    /// What to do when a request fails
    #[arg(long, value_enum, default_value_t = OnFailure::Fatal)]
    on_failure: OnFailure,

    /// Extra attempts per request with --on-failure retry
    #[arg(long, default_value_t = config::DEFAULT_RETRY_ATTEMPTS)]
    retries: u32,

    /// Delay between retries in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Additional title to ignore (repeatable)
    #[arg(long = "boring-title")]
    boring_titles: Vec<String>,

    /// Additional title regex to ignore (repeatable)
    #[arg(long = "boring-pattern")]
    boring_patterns: Vec<String>,

    /// Start from an empty filter instead of the Wikipedia defaults
    #[arg(long)]
    no_default_filter: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnFailure {
    Fatal,
    Skip,
    Retry,
}

impl SourceArgs {
    fn failure_policy(&self) -> FailurePolicy {
        match self.on_failure {
            OnFailure::Fatal => FailurePolicy::Fatal,
            OnFailure::Skip => FailurePolicy::Skip,
            OnFailure::Retry => FailurePolicy::Retry {
                attempts: self.retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }

    fn filter(&self) -> Result<BoringFilter> {
        let (mut titles, mut patterns): (Vec<String>, Vec<String>) = if self.no_default_filter {
            (Vec::new(), Vec::new())
        } else {
            (
                WIKIPEDIA_BORING_TITLES.iter().map(|t| t.to_string()).collect(),
                WIKIPEDIA_BORING_PATTERNS.iter().map(|p| p.to_string()).collect(),
            )
        };
        titles.extend(self.boring_titles.iter().cloned());
        patterns.extend(self.boring_patterns.iter().cloned());

        BoringFilter::new(titles, &patterns).context("Invalid --boring-pattern")
    }

    fn link_source(&self) -> Result<LinkSource> {
        let provider: Arc<dyn LinkProvider> = match &self.fixture {
            Some(path) => {
                let graph = FixtureGraph::load(path)?.with_page_size(self.page_size);
                info!(
                    path = %path.display(),
                    edges = graph.edge_count(),
                    "Loaded fixture graph"
                );
                Arc::new(graph)
            }
            None => Arc::new(
                WikipediaProvider::new(self.endpoint.clone(), &self.user_agent)
                    .context("Failed to build HTTP client")?,
            ),
        };

        Ok(LinkSource::new(provider, self.filter()?)
            .with_batch_size(self.batch_size)
            .with_failure_policy(self.failure_policy()))
    }
}

async fn run_race(args: RaceArgs) -> Result<()> {
    let options = SearchOptions {
        timeout: args.timeout.map(Duration::from_secs),
    };
    let coordinator = SearchCoordinator::new(args.source.link_source()?).with_options(options);

    let spinner = (!args.json).then(|| {
        make_spinner(&format!("Searching {} -> {} ...", args.from, args.to))
    });
    let result = coordinator.search(&args.from, &args.to).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let race = result
        .with_context(|| format!("Search from {:?} to {:?} failed", args.from, args.to))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&race)?);
        return Ok(());
    }

    for page in &race.path {
        println!("{page}");
    }
    println!();
    println!("Hops:               {}", race.hops());
    println!("Requests:           {}", race.stats.requests);
    println!("Titles visited:     {}", race.stats.forward_visited + race.stats.backward_visited);
    println!("Elapsed time:       {:.2}s", race.elapsed_secs);

    Ok(())
}

async fn run_links(args: LinksArgs) -> Result<()> {
    let source = args.source.link_source()?;
    let direction = if args.inbound {
        Direction::Inbound
    } else {
        Direction::Outbound
    };
    let stats = Arc::new(SearchStats::new());

    let edges = source
        .collect_links(direction, args.titles, Arc::clone(&stats))
        .await
        .context("Failed to fetch links")?;

    for edge in &edges {
        match direction {
            Direction::Outbound => println!("{} -> {}", edge.from, edge.to),
            Direction::Inbound => println!("{} <- {}", edge.to, edge.from),
        }
    }
    eprintln!(
        "{} links ({} filtered) in {} requests",
        edges.len(),
        stats.filtered(),
        stats.requests()
    );

    Ok(())
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn run(command: Commands) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("wikirace-worker")
        .enable_all()
        .build()?;

    match command {
        Commands::Race(args) => rt.block_on(run_race(args)),
        Commands::Links(args) => rt.block_on(run_links(args)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli.command) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
