//! roichart CLI - centile scoring and scripted dashboard sessions.
//!
//! Scores subject datasets against reference centile tables and replays
//! dashboard command scripts, printing layouts and figure data as JSON.
#![allow(
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    clippy::manual_let_else,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use roichart_core::{augment_with_centiles, compute_axis_bounds, CentileKind, DatasetProvider};
use roichart_dashboard::{
    Command, DashboardConfig, DashboardState, Figure, Layout, Selection, Warning,
};
use roichart_io::{read_centile_table, CsvProvider, DatasetReader, DatasetWriter};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    RoichartIo(#[from] roichart_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] roichart_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no reference centiles for {0}")]
    MissingReference(CentileKind),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}

/// Reference population selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Reference {
    /// Cognitively normal subjects
    Cn,
    /// Cognitively normal males
    CnMales,
    /// Cognitively normal females
    CnFemales,
    /// Cognitively normal subjects, ICV-corrected volumes
    CnIcvCorrected,
}

impl From<Reference> for CentileKind {
    fn from(value: Reference) -> Self {
        match value {
            Reference::Cn => CentileKind::Cn,
            Reference::CnMales => CentileKind::CnMales,
            Reference::CnFemales => CentileKind::CnFemales,
            Reference::CnIcvCorrected => CentileKind::CnIcvCorrected,
        }
    }
}

/// Regional brain-volume centiles and dashboard sessions.
#[derive(Parser)]
#[command(name = "roichart")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subject identifier column
    #[arg(long, global = true, default_value = "MRID")]
    id_column: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append <ROI>_centiles columns to a dataset
    Centiles {
        /// Input dataset CSV
        input: PathBuf,

        /// Reference centile table CSV
        #[arg(short, long)]
        reference: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Age column
        #[arg(long, default_value = "Age")]
        age_column: String,
    },

    /// Print one subject's centiles as JSON
    Subject {
        /// Input dataset CSV
        input: PathBuf,

        /// Subject identifier
        #[arg(short, long)]
        subject: String,

        /// Directory with istag_centiles_<kind>.csv files
        #[arg(long)]
        centile_dir: PathBuf,

        /// Reference population
        #[arg(short, long, value_enum, default_value = "cn")]
        kind: Reference,
    },

    /// Print default axis bounds of dataset columns
    Bounds {
        /// Input dataset CSV
        input: PathBuf,

        /// Columns to report (all numeric columns when omitted)
        variables: Vec<String>,
    },

    /// Replay a JSON command script and print the resulting dashboard
    Session {
        /// Input dataset CSV
        input: PathBuf,

        /// JSON array of dashboard commands
        #[arg(short, long)]
        script: PathBuf,

        /// Dashboard configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory with istag_centiles_<kind>.csv files
        #[arg(long)]
        centile_dir: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

/// Output of the `session` command.
#[derive(Serialize)]
struct SessionReport {
    layout: Layout,
    figures: Vec<Figure>,
    selection: Selection,
    warnings: Vec<Warning>,
    errors: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let reader = DatasetReader::new().with_id_column(&cli.id_column);

    match cli.command {
        Commands::Centiles {
            input,
            reference,
            output,
            age_column,
        } => {
            let dataset = reader.read_path(&input)?;
            let table = read_centile_table(&reference)?;
            let scored = augment_with_centiles(&dataset, &table, &age_column)?;

            for (subject, ambiguous) in &scored.ambiguous {
                log::warn!("{subject}: {ambiguous}");
            }
            DatasetWriter::create(&output)?.write_dataset(&scored.dataset)?;

            println!(
                "Scored {} subjects, added {} columns -> {}",
                scored.dataset.len(),
                scored.added_columns.len(),
                output.display()
            );
            if !scored.ambiguous.is_empty() {
                println!("  {} ambiguous cells left empty", scored.ambiguous.len());
            }
        }

        Commands::Subject {
            input,
            subject,
            centile_dir,
            kind,
        } => {
            let kind = CentileKind::from(kind);
            let provider = CsvProvider::new(&input)
                .with_reader(reader)
                .with_centile_dir(&centile_dir);
            let mut state =
                DashboardState::new(provider.load_dataset()?, DashboardConfig::default());
            let table = provider
                .load_centiles(kind)?
                .ok_or(CliError::MissingReference(kind))?;
            state.set_reference(kind, table);

            if state.dataset().row_of(&subject).is_none() {
                return Err(CliError::UnknownSubject(subject));
            }
            state.apply(Command::SelectSubject {
                subject: Some(subject.clone()),
            })?;
            let centiles = state
                .subject_centiles(kind)
                .ok_or(CliError::MissingReference(kind))?;

            let ambiguous: Vec<Warning> =
                centiles.ambiguous.into_iter().map(Warning::from).collect();
            let out = serde_json::json!({
                "subject": subject,
                "reference": kind.to_string(),
                "reference_age": centiles.reference_age,
                "centiles": centiles.centiles,
                "ambiguous": ambiguous,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Commands::Bounds { input, variables } => {
            let dataset = reader.read_path(&input)?;
            let variables = if variables.is_empty() {
                dataset
                    .numeric_columns()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            } else {
                variables
            };
            for var in &variables {
                match compute_axis_bounds(&dataset, var) {
                    Some(b) => println!("{var}: {} .. {}", b.min, b.max),
                    None => println!("{var}: unset"),
                }
            }
        }

        Commands::Session {
            input,
            script,
            config,
            centile_dir,
            pretty,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => DashboardConfig::default(),
            };
            let mut provider = CsvProvider::new(&input).with_reader(reader);
            if let Some(dir) = &centile_dir {
                provider = provider.with_centile_dir(dir);
            }
            let mut state = DashboardState::from_provider(&provider, config)?;

            let commands: Vec<Command> = serde_json::from_str(&std::fs::read_to_string(&script)?)?;
            log::info!("replaying {} commands", commands.len());

            let mut warnings = Vec::new();
            let mut errors = Vec::new();
            for (index, command) in commands.into_iter().enumerate() {
                let name = command.name();
                match state.apply(command) {
                    Ok(w) => warnings.extend(w),
                    Err(e) => {
                        log::error!("command {index} ({name}): {e}");
                        errors.push(format!("command {index} ({name}): {e}"));
                    }
                }
            }

            let (layout, layout_warnings) = state.layout();
            warnings.extend(layout_warnings);
            let report = SessionReport {
                layout,
                figures: state.figures(),
                selection: state.selection().clone(),
                warnings,
                errors,
            };
            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<DashboardConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
