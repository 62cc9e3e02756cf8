//! `invmatch run | validate | stats`: config-driven inventory-number reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;
use invmatch_recon::config::ExtractionSource;
use invmatch_recon::report::render_all;
use invmatch_recon::{Category, ReconConfig, ReconResult, SourceIndex, SourceKind};

use crate::CliError;

/// Source selection shared by `run` and `stats`. File flags override the
/// config; without a config they are the only source of paths.
#[derive(Args)]
pub struct SourceArgs {
    /// Path to the TOML config
    pub config: Option<PathBuf>,

    /// Alma holdings export, CSV (overrides alma.file)
    #[arg(long)]
    pub alma_file: Option<PathBuf>,

    /// FileMaker export, JSON array (overrides filemaker.file)
    #[arg(long)]
    pub filemaker_file: Option<PathBuf>,

    /// Extraction sheet, XLSX/ODS/CSV (overrides extraction.file)
    #[arg(long)]
    pub extraction_file: Option<PathBuf>,

    /// Worksheet holding the extraction column (overrides extraction.sheet)
    #[arg(long)]
    pub sheet: Option<String>,
}

/// Config with command-line overrides applied, plus the directory that
/// relative config paths resolve against.
struct Resolved {
    config: ReconConfig,
    base_dir: PathBuf,
}

fn resolve_config(args: &SourceArgs) -> Result<Resolved, CliError> {
    let (mut config, base_dir) = match args.config {
        Some(ref path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::config(format!("cannot read config {}: {e}", path.display()))
            })?;
            let config = ReconConfig::parse_toml(&text).map_err(|e| CliError::config(e.to_string()))?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (config, base_dir)
        }
        None => {
            if args.alma_file.is_none() || args.filemaker_file.is_none() {
                return Err(CliError::usage("no config file and no source files given")
                    .with_hint("pass a config path, or --alma-file and --filemaker-file"));
            }
            (ReconConfig::named("command line"), PathBuf::from("."))
        }
    };

    if let Some(ref path) = args.alma_file {
        config.alma.file = cli_path(path)?;
    }
    if let Some(ref path) = args.filemaker_file {
        config.filemaker.file = cli_path(path)?;
    }
    if let Some(ref path) = args.extraction_file {
        let file = cli_path(path)?;
        match config.extraction {
            Some(ref mut extraction) => extraction.file = file,
            None => config.extraction = Some(ExtractionSource::with_file(file)),
        }
    }
    if let Some(ref sheet) = args.sheet {
        match config.extraction {
            Some(ref mut extraction) => extraction.sheet = sheet.clone(),
            None => {
                return Err(CliError::usage("--sheet given without an extraction source")
                    .with_hint("add --extraction-file or an [extraction] section"))
            }
        }
    }

    tracing::debug!(config = %config.name, base_dir = %base_dir.display(), "config resolved");
    Ok(Resolved { config, base_dir })
}

/// Command-line paths are relative to the working directory, not the config.
fn cli_path(path: &Path) -> Result<String, CliError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| CliError::general(format!("cannot resolve working directory: {e}")))?
            .join(path)
    };
    Ok(absolute.to_string_lossy().into_owned())
}

fn load(config: &ReconConfig, base_dir: &Path) -> Result<invmatch_recon::ReconInput, CliError> {
    invmatch_io::load_input(config, base_dir).map_err(|e| CliError::load(e.to_string()))
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(
    sources: SourceArgs,
    output: Option<PathBuf>,
    json: bool,
    json_output: Option<PathBuf>,
) -> Result<(), CliError> {
    if sources.config.is_none() && output.is_none() {
        return Err(CliError::usage("--output is required without a config file")
            .with_hint("pass a config path, or --alma-file, --filemaker-file and --output"));
    }

    let Resolved { mut config, base_dir } = resolve_config(&sources)?;
    if let Some(ref path) = output {
        config.output.workbook = cli_path(path)?;
    }
    if let Some(ref path) = json_output {
        config.output.json = Some(cli_path(path)?);
    }
    config.validate().map_err(|e| CliError::config(e.to_string()))?;

    let input = load(&config, &base_dir)?;
    let result = invmatch_recon::run(&config, &input).map_err(|e| CliError::general(e.to_string()))?;

    let workbook = invmatch_io::resolve(&base_dir, &config.output.workbook);
    invmatch_io::xlsx::write_report(&render_all(&result), &workbook)
        .map_err(|e| CliError::write(e.to_string()))?;
    eprintln!("wrote {}", workbook.display());

    if let Some(ref json_file) = config.output.json {
        let path = invmatch_io::resolve(&base_dir, json_file);
        invmatch_io::json::write_result(&result, &path).map_err(|e| CliError::write(e.to_string()))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} single and {} compound queries, {} perfect, {} multi-match, {} one-sided, {} unmatched",
        result.meta.config_name,
        s.single_queries,
        s.compound_queries,
        s.perfect_matches,
        s.multi_matches,
        s.one_sided,
        s.unmatched,
    );
    if result.has_extraction() {
        eprintln!("perfect in all sources: {}", s.perfect_all_sources);
    }
    for category in Category::ALL {
        let n = result.bucket_len(category);
        if n > 0 {
            eprintln!("  {:<32} {n}", category.name());
        }
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", config_path.display())))?;
    let config = ReconConfig::from_toml(&text).map_err(|e| CliError::config(e.to_string()))?;

    let sources = if config.extraction.is_some() { 3 } else { 2 };
    eprintln!("{}: valid ({sources} sources, report {})", config.name, config.output.workbook);
    Ok(())
}

// ============================================================================
// stats
// ============================================================================

pub fn cmd_stats(sources: SourceArgs, json: bool) -> Result<(), CliError> {
    let Resolved { config, base_dir } = resolve_config(&sources)?;
    config.validate().map_err(|e| CliError::config(e.to_string()))?;
    let input = load(&config, &base_dir)?;

    let mut stats = vec![
        SourceIndex::from_records(SourceKind::Alma, &input.alma).stats(),
        SourceIndex::from_records(SourceKind::FileMaker, &input.filemaker).stats(),
    ];
    if let Some(ref rows) = input.extraction {
        stats.push(SourceIndex::from_extraction(rows).stats());
    }

    if json {
        let json_str = serde_json::to_string_pretty(&stats)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    for s in &stats {
        println!(
            "Counts for {}: {} total, {} unique, {} singletons, {} repeats, {} empty",
            s.source.label(),
            s.total,
            s.distinct,
            s.singletons,
            s.repeats,
            s.empty,
        );
    }
    Ok(())
}
