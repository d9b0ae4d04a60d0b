use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scanboard::activity::{ActivityProbe, SystemActivityProbe};
use scanboard::clock::{now_display, now_rfc3339};
use scanboard::config::BoardPaths;
use scanboard::render::render;
use scanboard::rollup::collect;
use scanboard::seed::SeedList;
use scanboard::simulate::write_simulated_data;
use scanboard::source::DirStatusSource;
use scanboard::store::{LoadOutcome, SnapshotStore};
use scanboard::server;

/// scanboard — rolls up Strix/Nikto/Nmap scan status into a static, filterable status board.
#[derive(Debug, Parser)]
#[command(
    name = "scanboard",
    version,
    about = "Rolls up Strix/Nikto/Nmap scan status into a static, filterable status board.",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    paths: BoardPaths,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json", global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read every tool's status for every seeded target and overwrite the snapshot.
    Collect {
        /// Write illustrative status records and a seed list first.
        #[arg(long, default_value_t = false)]
        simulate: bool,
    },
    /// Regenerate the board from the current snapshot.
    Render,
    /// Serve the rendered board over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Collect { simulate } => run_collect(&cli.paths, simulate),
        Command::Render => run_render(&cli.paths),
        Command::Serve { bind } => server::serve_board(&bind, &cli.paths.output).await,
    }
}

fn run_collect(paths: &BoardPaths, simulate: bool) -> Result<()> {
    let source = DirStatusSource::new(&paths.status_dir);
    if simulate {
        write_simulated_data(&source, &paths.seed)?;
        println!("Simulated scan data written to {}", source.dir().display());
    }

    let seed = SeedList::read_or_default(&paths.seed);

    let (snapshot, report) = collect(&source, &seed, &now_rfc3339());
    let store = SnapshotStore::new(&paths.snapshot, Some(paths.seed.clone()));
    store.save(&snapshot)?;
    println!(
        "Collected {} projects ({} reported, {} absent, {} malformed) -> {}",
        snapshot.projects.len(),
        report.reported,
        report.absent,
        report.malformed,
        store.path().display()
    );
    Ok(())
}

fn run_render(paths: &BoardPaths) -> Result<()> {
    let store = SnapshotStore::new(&paths.snapshot, Some(paths.seed.clone()));
    let loaded = store.load(&now_rfc3339());
    let activity = SystemActivityProbe.probe();
    let doc = render(&loaded.snapshot, activity, &now_display())?;
    doc.write(&paths.output)?;

    let origin = match &loaded.outcome {
        LoadOutcome::Persisted => String::new(),
        LoadOutcome::Fallback { reason, source } => format!(" [fallback: {reason}, {source:?}]"),
    };
    println!(
        "Board updated: {} projects, {} active scan processes -> {}{}",
        doc.project_count,
        activity.total(),
        paths.output.display(),
        origin
    );
    Ok(())
}
