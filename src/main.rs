use chrono::Local;
use clap::{Parser, Subcommand};
use shelf_scrape::analysis::{analyze, load_items};
use shelf_scrape::config::ScrapeArgs;
use shelf_scrape::filter::FilterQuery;
use shelf_scrape::merger::scrape_all;
use shelf_scrape::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "shelf-scrape")]
#[command(about = "Scrape Douban collections into JSON history and chart the movie log")]
#[command(version)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every collection page not seen before
    Fetch {
        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Serve static files, the cover cache and the refresh endpoint
    Serve {
        #[command(flatten)]
        scrape: ScrapeArgs,

        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Directory with index.html and analysis.html
        #[arg(long, default_value = ".")]
        static_dir: PathBuf,
    },

    /// Print the dashboard for a movies document as JSON
    Analyze {
        /// Path or http(s) URL of movies.json
        #[arg(default_value = "./data/movies.json")]
        source: String,

        #[command(flatten)]
        filter: FilterQuery,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Fetch { scrape } => {
            let reports = scrape_all(&scrape.settings()).await?;
            for report in reports {
                info!(
                    "{}: {} new over {} pages, {} total ({:?})",
                    report.category, report.new_items, report.pages, report.total, report.stop
                );
            }
        }
        Commands::Serve {
            scrape,
            port,
            static_dir,
        } => {
            let settings = scrape.settings();
            let state = AppState::new(
                settings.data_dir.clone(),
                Arc::new(settings),
                Arc::new(reqwest::Client::new()),
            );
            server::serve(state, &static_dir, port).await?;
        }
        Commands::Analyze { source, filter } => {
            let items = load_items(&source).await?;
            let range = filter.resolve(Local::now().date_naive());
            let dashboard = analyze(&items, &range);
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
    }

    Ok(())
}
