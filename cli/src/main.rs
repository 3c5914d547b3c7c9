//! BucketSpool CLI — spool a directory-backed bucket into JSON records.
//!
//! # Commands
//! ```text
//! bucketspool run    --bucket <name> [--root <dir>] [--config <spool.yaml>] ...
//! bucketspool status --bucket <name> [--root <dir>] [--json]
//! ```

use anyhow::Result;
use bucketspool_core::OnRecordError;
use bucketspool_decoders::DataFormat;
use bucketspool_observability::init_tracing;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd_run;
mod cmd_status;
mod config;
mod listing;

use config::SpoolConfig;

#[derive(Parser)]
#[command(
    name = "bucketspool",
    about = "Resumable batch spooler for object-store buckets",
    long_about = "
BucketSpool reads every object of a bucket directory (<root>/<bucket>/<key>),
decodes it into records, and writes them to stdout as JSON lines. Offsets are
checkpointed after every batch so interrupted runs resume mid-object.
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spool all unfinished objects to stdout
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Data format: json | text | whole-object
        #[arg(long)]
        format: Option<DataFormat>,
        /// Maximum records per batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Record error policy: discard | to-error | stop-pipeline
        #[arg(long)]
        on_record_error: Option<OnRecordError>,
        /// Copy object metadata into record headers
        #[arg(long)]
        metadata: bool,
        /// Read only the first MiB of each object
        #[arg(long)]
        preview: bool,
        /// Emit JSON structured logs
        #[arg(long)]
        json_logs: bool,
    },

    /// Show each object and its checkpointed offset
    Status {
        #[command(flatten)]
        source: SourceArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// YAML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory holding one sub-directory per bucket
    #[arg(long)]
    root: Option<PathBuf>,
    #[arg(long)]
    bucket: Option<String>,
    /// Only objects whose key starts with this prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Offset checkpoint file
    #[arg(long)]
    offsets: Option<PathBuf>,
}

impl SourceArgs {
    fn load(self) -> Result<SpoolConfig> {
        let mut config = match &self.config {
            Some(path) => SpoolConfig::load(path)?,
            None => SpoolConfig::default(),
        };
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(bucket) = self.bucket {
            config.bucket = bucket;
        }
        if let Some(prefix) = self.prefix {
            config.prefix = Some(prefix);
        }
        if let Some(offsets) = self.offsets {
            config.offsets_file = offsets;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            format,
            batch_size,
            on_record_error,
            metadata,
            preview,
            json_logs,
        } => {
            let mut config = source.load()?;
            if let Some(format) = format {
                config.decoder.format = format;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if let Some(policy) = on_record_error {
                config.producer.on_record_error = policy;
            }
            config.producer.enable_metadata |= metadata;
            config.producer.preview |= preview;
            config.log.json |= json_logs;
            if cli.verbose {
                config.log.level = "debug".into();
            }

            let config = config.finish()?;
            init_tracing(&config.log);
            cmd_run::run(config).await
        }

        Commands::Status { source, json } => {
            let mut config = source.load()?;
            if cli.verbose {
                config.log.level = "debug".into();
            }
            let config = config.finish()?;
            init_tracing(&config.log);
            cmd_status::run(&config, json).await
        }
    }
}
