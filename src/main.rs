mod check;
mod error;
mod output;
mod parser;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use parser::classify::HighlightRule;
use parser::fragments::FoliumExtractor;
use settings::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "talhoes_extract",
    about = "Extract plot polygons from an exported harvest map into a GeoJSON data module"
)]
struct Cli {
    /// Config file (default: ./talhoes.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Exported map HTML
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Plot name to highlight (repeatable; replaces the configured set)
    #[arg(long = "highlight", value_name = "NAME")]
    highlight: Vec<String>,
    /// Crop label a highlighted plot must carry
    #[arg(long, value_name = "LABEL")]
    crop: Option<String>,
}

impl SourceArgs {
    fn into_overrides(self, output: Option<PathBuf>) -> Overrides {
        Overrides {
            input: self.input,
            output,
            highlight: self.highlight,
            target_crop: self.crop,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, join and partition plots, then write the data module
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// Generated TypeScript module
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Refuse to write when an identifier appears more than once
        #[arg(long)]
        strict: bool,
    },
    /// Look for each highlighted plot name in the raw map
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show fragment and join counts without writing anything
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let base = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Extract {
            source,
            output,
            strict,
        } => {
            let settings = base.apply(source.into_overrides(output));
            run_extract(&settings, strict)
        }
        Commands::Check { source } => {
            let settings = base.apply(source.into_overrides(None));
            let doc = read_input(&settings)?;
            let lines = check::check_plots(
                &doc,
                settings.highlight.iter().map(String::as_str),
                &settings.target_crop,
            );
            check::print(&lines, &settings.target_crop);
            Ok(())
        }
        Commands::Stats { source } => {
            let settings = base.apply(source.into_overrides(None));
            let doc = read_input(&settings)?;
            let rule = HighlightRule::from_settings(&settings);
            let (_, report) = parser::correlate_document(&doc, &FoliumExtractor, &rule);
            report.print();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_input(settings: &Settings) -> Result<String> {
    let doc = std::fs::read_to_string(&settings.input)
        .with_context(|| format!("Failed to read {}", settings.input.display()))?;
    info!(path = %settings.input.display(), bytes = doc.len(), "Loaded map");
    Ok(doc)
}

fn run_extract(settings: &Settings, strict: bool) -> Result<()> {
    let doc = read_input(settings)?;
    let rule = HighlightRule::from_settings(settings);
    let processed = parser::process_document(&doc, &FoliumExtractor, &rule);
    let report = &processed.report;

    println!("GeoJSON fragments found: {}", report.geometry_fragments);
    println!("Tooltip fragments found: {}", report.metadata_fragments);

    if strict && !report.duplicate_ids.is_empty() {
        bail!(
            "Duplicate identifiers in {}: {}",
            settings.input.display(),
            report.duplicate_ids.join(", ")
        );
    }

    let module = output::render_module(&processed.partition)?;
    output::write_atomic(&settings.output, &module)?;

    processed.partition.print_summary(rule.target_crop());
    if !report.skipped.is_empty() {
        println!("\nSkipped {} fragments", report.skipped.len());
    }
    println!("\nSaved to {}", settings.output.display());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(dir: &tempfile::TempDir) -> Settings {
        Settings {
            input: PathBuf::from("tests/fixtures/mapa.html"),
            output: dir.path().join("talhoes-geojson.ts"),
            ..Settings::default()
        }
    }

    #[test]
    fn extract_writes_module() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(&dir);
        run_extract(&settings, false).unwrap();

        let ts = std::fs::read_to_string(&settings.output).unwrap();
        assert!(ts.contains("export const cottonTalhoes"));
        assert!(ts.contains("\"nome\": \"1B\""));
        assert!(!ts.contains("0a07"));
    }

    #[test]
    fn extract_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(&dir);
        run_extract(&settings, false).unwrap();
        let first = std::fs::read(&settings.output).unwrap();
        run_extract(&settings, false).unwrap();
        let second = std::fs::read(&settings.output).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn strict_mode_rejects_duplicates_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(&dir);
        let err = run_extract(&settings, true).unwrap_err();
        assert!(err.to_string().contains("dd04"));
        assert!(!settings.output.exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            input: dir.path().join("absent.html"),
            ..settings_for(&dir)
        };
        assert!(run_extract(&settings, false).is_err());
        assert!(!settings.output.exists());
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
    }
}
