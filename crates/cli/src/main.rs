use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hirepulse_core::aggregate::ReportWindows;
use hirepulse_core::config::Settings;
use hirepulse_core::insights::{generate_insights, high_intent_companies};
use hirepulse_core::report;
use hirepulse_core::storage::memory::MemoryJobStore;
use hirepulse_core::storage::postgres::PgJobStore;
use hirepulse_core::storage::JobStore;
use hirepulse_core::time::reference_date::resolve_reference_date;

#[derive(Debug, Parser)]
#[command(name = "hirepulse_cli", about = "Hiring intelligence reports from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Busiest companies of the week, scored against each other.
    Heatmap {
        #[command(flatten)]
        source: Source,
        /// Reference date (YYYY-MM-DD). Defaults to today's UTC date.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Top intent-scored companies of the heatmap, with their insight lines.
    Insights {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Full profile of one company.
    Company {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Most recent upload date with data.
    LatestDate {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Debug, Args)]
struct Source {
    /// Read postings from a JSON fixture instead of DATABASE_URL.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let now = chrono::Utc::now();

    let output = match cli.command {
        Command::Heatmap {
            source,
            date,
            limit,
        } => {
            let store = open_store(&source, settings).await?;
            let date = resolve_reference_date(date.as_deref(), now)?;
            let windows = ReportWindows::new(date, now, settings.freshness_anchor);
            let limit = limit.unwrap_or(settings.heatmap_default_limit);
            let heatmap = report::company_heatmap(store.as_ref(), &windows, limit).await?;
            serde_json::to_string_pretty(&heatmap)?
        }
        Command::Insights {
            source,
            date,
            limit,
        } => {
            let store = open_store(&source, settings).await?;
            let date = resolve_reference_date(date.as_deref(), now)?;
            let windows = ReportWindows::new(date, now, settings.freshness_anchor);
            let limit = limit.unwrap_or(settings.heatmap_default_limit);
            let heatmap = report::company_heatmap(store.as_ref(), &windows, limit).await?;
            let rows: Vec<serde_json::Value> = high_intent_companies(&heatmap.companies)
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "company": m.company,
                        "intentScore": m.intent_score,
                        "insights": generate_insights(m),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows)?
        }
        Command::Company { source, name, date } => {
            let store = open_store(&source, settings).await?;
            let date = resolve_reference_date(date.as_deref(), now)?;
            let windows = ReportWindows::new(date, now, settings.freshness_anchor);
            let dive = report::company_deep_dive(store.as_ref(), &windows, &name)
                .await?
                .with_context(|| format!("no postings for {name} in the 30 days up to {date}"))?;
            serde_json::to_string_pretty(&dive)?
        }
        Command::LatestDate { source } => {
            let store = open_store(&source, settings).await?;
            match store.latest_upload_date().await? {
                Some(d) => d.to_string(),
                None => anyhow::bail!("no postings in {}", store.store_name()),
            }
        }
    };

    println!("{output}");
    Ok(())
}

async fn open_store(source: &Source, settings: &Settings) -> anyhow::Result<Box<dyn JobStore>> {
    if let Some(path) = &source.fixture {
        let store = MemoryJobStore::from_fixture(path)?;
        tracing::info!(path = %path.display(), postings = store.len(), "loaded fixture");
        return Ok(Box::new(store));
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;
    hirepulse_core::storage::migrate(&pool).await?;
    Ok(Box::new(PgJobStore::new(pool)))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
