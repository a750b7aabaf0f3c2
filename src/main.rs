use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rater_artifact::FsStore;
use rater_config::StudyConfig;
use rater_engine::{
  LogNotifier, RATING_TASK, RunCompletionController, RunSnapshot, Timeline, TrialBuffer,
};
use rater_record::{SystemAmbient, TrialRecord, project};

/// Rater - result delivery for browser-run audio rating studies
#[derive(Parser)]
#[command(name = "rater")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the run timeline for a study
  Plan {
    /// Path to the study config (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Seed for the rating order; random if omitted
    #[arg(long)]
    seed: Option<u64>,
  },

  /// Print the delivery rows for a set of trial records
  Project {
    /// Trial records file (JSON array), or `-` for stdin
    #[arg(long, default_value = "-")]
    records: String,
  },

  /// Deliver a finished run, writing the CSV fallback if delivery fails
  Deliver {
    /// Path to the study config (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Trial records file (JSON array), or `-` for stdin
    #[arg(long, default_value = "-")]
    records: String,

    /// Directory the fallback CSV is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Override the endpoint from the config file
    #[arg(long)]
    endpoint: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.log_json);

  match cli.command {
    Some(Commands::Plan { config, seed }) => plan(config, seed)?,
    Some(Commands::Project { records }) => project_records(&records)?,
    Some(Commands::Deliver {
      config,
      records,
      out_dir,
      endpoint,
    }) => deliver(config, &records, out_dir, endpoint)?,
    None => {
      println!("rater - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let registry = tracing_subscriber::registry().with(filter);

  if json {
    registry
      .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
      .init();
  } else {
    registry
      .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
      .init();
  }
}

fn plan(config_file: PathBuf, seed: Option<u64>) -> Result<()> {
  let config = load_config(&config_file)?;

  let mut rng = match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };
  let timeline = Timeline::build(&config, &mut rng);

  info!(
    study = %config.name,
    stimuli = config.stimuli.len(),
    expected_records = timeline.expected_records(),
    "timeline built"
  );

  println!("{}", serde_json::to_string_pretty(&timeline)?);
  Ok(())
}

fn project_records(source: &str) -> Result<()> {
  let records = read_records(source)?;
  let rows = project(&records);
  println!("{}", serde_json::to_string_pretty(&rows)?);
  Ok(())
}

fn deliver(
  config_file: PathBuf,
  source: &str,
  out_dir: PathBuf,
  endpoint: Option<String>,
) -> Result<()> {
  let mut config = load_config(&config_file)?;
  if let Some(endpoint) = endpoint {
    config.delivery.endpoint = endpoint;
  }

  let records = read_records(source)?;
  let snapshot = snapshot_of(records)?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { deliver_async(config, snapshot, out_dir).await })
}

async fn deliver_async(config: StudyConfig, snapshot: RunSnapshot, out_dir: PathBuf) -> Result<()> {
  let controller = RunCompletionController::http(&config, FsStore::new(&out_dir))
    .context("failed to create http transport")?
    .notify_with(LogNotifier);

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let completion = controller
    .complete(snapshot, cancel)
    .await
    .context("run completion failed")?;

  if let Some(handle) = &completion.fallback {
    eprintln!("Upload failed. Save your data: {}", handle.location);
  }

  println!("{}", serde_json::to_string_pretty(&completion)?);
  Ok(())
}

fn load_config(path: &Path) -> Result<StudyConfig> {
  StudyConfig::load(path)
    .with_context(|| format!("failed to load study config: {}", path.display()))
}

/// Replay records into a fresh run. Rating trials go through their completion
/// hook so an unstamped export still carries a rating, timestamp and client.
fn snapshot_of(records: Vec<TrialRecord>) -> Result<RunSnapshot> {
  let mut buffer = TrialBuffer::new();
  for record in records {
    let pushed = if record.task() == Some(RATING_TASK) {
      buffer.push_rating(record, &SystemAmbient)
    } else {
      buffer.push(record)
    };
    pushed.context("trial records are out of order")?;
  }
  Ok(buffer.finish())
}

fn read_records(source: &str) -> Result<Vec<TrialRecord>> {
  let content = if source == "-" {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read records from stdin")?;
    input
  } else {
    std::fs::read_to_string(source)
      .with_context(|| format!("failed to read records file: {}", source))?
  };

  if content.trim().is_empty() {
    return Ok(Vec::new());
  }

  serde_json::from_str(&content).context("failed to parse trial records JSON")
}
