// invmatch CLI - inventory-number reconciliation across Alma, FileMaker and
// the tape extraction sheet

mod exit_codes;
mod recon;

use std::process::ExitCode;
use std::sync::Once;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_ERROR, EXIT_INPUT_LOAD, EXIT_INVALID_CONFIG, EXIT_OUTPUT_WRITE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "invmatch")]
#[command(about = "Reconcile inventory numbers across catalog exports")]
#[command(version)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every inventory number and write the report workbook
    #[command(after_help = "\
Examples:
  invmatch run inventory.toml
  invmatch run inventory.toml --json > result.json
  invmatch run --alma-file holdings.csv --filemaker-file filemaker.json \\
      --extraction-file tapes.xlsx --output matches.xlsx")]
    Run {
        #[command(flatten)]
        sources: recon::SourceArgs,

        /// Report workbook path (overrides output.workbook)
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the full result as JSON to a file (overrides output.json)
        #[arg(long)]
        json_output: Option<std::path::PathBuf>,
    },

    /// Parse and validate a config file without loading any source
    #[command(after_help = "\
Examples:
  invmatch validate inventory.toml")]
    Validate {
        /// Path to the TOML config
        config: std::path::PathBuf,
    },

    /// Print per-source identifier counts
    #[command(after_help = "\
Examples:
  invmatch stats inventory.toml
  invmatch stats --alma-file holdings.csv --filemaker-file filemaker.json --json")]
    Stats {
        #[command(flatten)]
        sources: recon::SourceArgs,

        /// Print counts as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { sources, output, json, json_output } => {
            recon::cmd_run(sources, output, json, json_output)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Stats { sources, json } => recon::cmd_stats(sources, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

static LOGGING: Once = Once::new();

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    LOGGING.call_once(|| {
        let default = if verbose {
            "invmatch=debug,invmatch_recon=debug,invmatch_io=debug"
        } else {
            "invmatch=info,invmatch_recon=info,invmatch_io=info"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT_LOAD, message: msg.into(), hint: None }
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT_WRITE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
