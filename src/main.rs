use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use dist_tag_sync::app::{self, RunOptions};
use dist_tag_sync::config::{self, DEFAULT_MANIFEST_FILE, LOG_ENV_VAR, SourceKind};
use dist_tag_sync::process::TokioCommandRunner;

#[derive(Parser)]
#[command(name = "dist-tag-sync")]
#[command(version, about = "Update package.json dependencies to their npm dist-tag versions")]
struct Cli {
    /// Manifest to update
    #[arg(long, default_value = DEFAULT_MANIFEST_FILE)]
    manifest: PathBuf,

    /// Config file (defaults to dist-tag-sync.json next to the manifest)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to fetch dist-tags from
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Base URL of the npm registry (with --source registry)
    #[arg(long)]
    registry_url: Option<String>,

    /// Keep going when `npm install` fails
    #[arg(long)]
    tolerate_install_failure: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write the manifest but skip reinstalling
    #[arg(long)]
    skip_maintenance: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            manifest_path: self.manifest.clone(),
            config_path: self.config.clone(),
            source: self.source,
            registry_url: self.registry_url.clone(),
            tolerate_install_failure: self.tolerate_install_failure,
            dry_run: self.dry_run,
            skip_maintenance: self.skip_maintenance,
        }
    }
}

/// Log to stderr; with `-v` also to a daily file under the data directory.
fn init_logging(verbose: u8) -> Option<WorkerGuard> {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let log_dir = config::log_dir();
    if verbose == 0 || std::fs::create_dir_all(&log_dir).is_err() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "dist-tag-sync.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr.and(non_blocking_appender))
        .with_target(false)
        .without_time()
        .try_init();

    Some(guard)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let guard = init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(app::run(&cli.run_options(), Arc::new(TokioCommandRunner)));

    match result {
        Ok(_) => Ok(()),
        Err(e) => match e.exit_code() {
            // Mirror the exit status of the command that failed
            Some(code) => {
                error!("{:#}", anyhow::Error::from(e));
                drop(guard);
                std::process::exit(code);
            }
            None => Err(anyhow::Error::from(e).context("dist-tag-sync failed")),
        },
    }
}
