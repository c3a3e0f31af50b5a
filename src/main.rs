use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xlsx_merge::io::progress::{ProgressSink, TracingSink};
use xlsx_merge::{MergeConfig, Result, ToolError, merge};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("xlsx_merge=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.default_output_dir.clone());

    let mut log = TracingSink;
    let mut print_progress = |message: &str| {
        log.append(message);
        println!("{message}");
    };
    let outcome = merge(&args.input, &output, &config, &mut print_progress)?;

    if !outcome.skipped_files.is_empty() {
        println!("skipped: {}", outcome.skipped_files.join(", "));
    }
    println!("{}", outcome.output_path.display());
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge every Excel workbook in a folder into one formatted workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the spreadsheets of a folder, using the first one as the template.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Folder holding the workbooks to merge.
    #[arg(long)]
    input: PathBuf,

    /// Folder receiving the merged workbook.
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file with merge settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Add a leading column with this label naming each row's source file.
    #[arg(long)]
    source_column: Option<String>,

    /// Rows written per progress step.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Consecutive empty header cells that end the header row.
    #[arg(long)]
    empty_column_threshold: Option<u32>,

    /// Maximum number of header columns scanned.
    #[arg(long)]
    max_columns: Option<u32>,

    /// Digit-only values longer than this are kept as text.
    #[arg(long)]
    long_number_threshold: Option<usize>,

    /// Header keyword marking an amount column; replaces the defaults when given.
    #[arg(long = "amount-keyword")]
    amount_keywords: Vec<String>,
}

impl MergeArgs {
    fn resolve_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => MergeConfig::load(path)?,
            None => MergeConfig::default(),
        };

        if let Some(label) = &self.source_column {
            config.provenance_column = Some(label.clone());
        }
        if let Some(size) = self.batch_size {
            config.write_batch_size = size;
        }
        if let Some(threshold) = self.empty_column_threshold {
            config.empty_column_threshold = threshold;
        }
        if let Some(limit) = self.max_columns {
            config.max_columns = limit;
        }
        if let Some(threshold) = self.long_number_threshold {
            config.long_number_threshold = threshold;
        }
        if !self.amount_keywords.is_empty() {
            config.amount_keywords = self.amount_keywords.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
