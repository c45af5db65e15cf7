//! secmatrix - security assignment matrix formatter
//!
//! Converts a security object assignment extract (CSV or Arrow IPC) into a
//! formatted XLSX pivot with one row per user.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secmatrix_xlsx::{
    C_FILE_NAME_DEFAULT, SpecCodeLabelMap, SpecRenderOptions, SpecSecMatrixConfig,
    XlsxReportWriter, read_assignment_rows_from_path,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// secmatrix - security assignment matrix formatter
#[derive(Parser, Debug)]
#[command(name = "secmatrix")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an assignment extract into a formatted workbook
    Render {
        /// Input extract (.csv, or .arrow/.ipc/.feather)
        input: PathBuf,

        /// Output workbook path
        #[arg(short, long, default_value = C_FILE_NAME_DEFAULT)]
        output: PathBuf,

        /// Path to TOML configuration (labels, captions, colors, widths)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the output sheet name
        #[arg(long)]
        sheet_name: Option<String>,
    },

    /// Print the effective code to context-name table
    Labels {
        /// Path to TOML configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Render {
            input,
            output,
            config,
            sheet_name,
        } => run_render(&input, &output, config.as_deref(), sheet_name),
        Commands::Labels { config } => run_labels(config.as_deref()),
    }
}

fn load_setup(config: Option<&Path>) -> Result<(SpecCodeLabelMap, SpecRenderOptions)> {
    let cfg = match config {
        Some(path) => SpecSecMatrixConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SpecSecMatrixConfig::default(),
    };
    Ok((cfg.code_label_map(), cfg.render_options()))
}

fn run_render(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    sheet_name: Option<String>,
) -> Result<()> {
    let (labels, mut options) = load_setup(config)?;
    if let Some(sheet_name) = sheet_name {
        options.sheet_name = sheet_name;
    }

    let table = read_assignment_rows_from_path(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    info!(cnt_rows = table.rows.len(), "assignment extract loaded");

    let report = XlsxReportWriter::new(labels, options)
        .render_to_file(&table, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    for c_warning in &report.warnings {
        warn!("{c_warning}");
    }
    println!("{report}");
    println!("Wrote {}", output.display());
    Ok(())
}

fn run_labels(config: Option<&Path>) -> Result<()> {
    let (labels, _) = load_setup(config)?;
    for (c_code, c_label) in labels.iter() {
        println!("{c_code}\t{c_label}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render_defaults() {
        let cli = Cli::try_parse_from(["secmatrix", "render", "extract.csv"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Commands::Render {
                input,
                output,
                config,
                sheet_name,
            } => {
                assert_eq!(input, PathBuf::from("extract.csv"));
                assert_eq!(output, PathBuf::from(C_FILE_NAME_DEFAULT));
                assert!(config.is_none());
                assert!(sheet_name.is_none());
            }
            Commands::Labels { .. } => panic!("expected render"),
        }
    }

    #[test]
    fn test_cli_parses_labels_with_config() {
        let cli = Cli::try_parse_from([
            "secmatrix",
            "labels",
            "--config",
            "labels.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Labels { config: Some(_) }));
    }

    #[test]
    fn test_run_render_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path_csv = dir.path().join("extract.csv");
        let path_xlsx = dir.path().join("report.xlsx");
        std::fs::write(
            &path_csv,
            "USERNAME,SEC_OBJ_CODE,SEC_OBJ_MEMBER_VAL,SEC_OBJ_MEMBER_NAME,OPERATION\n\
             alice,OA4F_SEC_FIN_LEDGER_LIST,1,Main,ADD\n",
        )
        .unwrap();

        run_render(&path_csv, &path_xlsx, None, Some("Ledgers".to_string())).unwrap();
        assert!(std::fs::read(&path_xlsx).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_load_setup_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path_cfg = dir.path().join("bad.toml");
        std::fs::write(&path_cfg, "[colors]\nmarker = \"blue\"\n").unwrap();
        assert!(load_setup(Some(&path_cfg)).is_err());
    }
}
