//! LeaseDoc CLI
//!
//! With no arguments: builds the lease contract template at its fixed paths
//! and prints `OK: <output>`.
//! Commands: build (default), lint, classify
//! Returns non-zero when the build or lint fails

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use leasedoc_core::{pipeline::split_lines, BuildProfile, CompilationPipeline};

#[derive(Parser)]
#[command(name = "leasedoc-cli")]
#[command(about = "LeaseDoc CLI - Lease Contract Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory that relative profile paths resolve against
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// JSON build profile (defaults to the lease contract)
    #[arg(short, long)]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the DOCX template
    Build {
        /// Also write the build manifest to this path
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Lint the template source, print the report as JSON
    Lint,

    /// Print the line classification as JSON
    Classify,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let profile = match &cli.profile {
        Some(path) => match BuildProfile::load(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to load profile: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => BuildProfile::default(),
    };

    match cli.command.unwrap_or(Commands::Build { manifest: None }) {
        Commands::Build { manifest } => {
            let profile = BuildProfile {
                manifest: manifest.or(profile.manifest),
                ..profile
            };
            let pipeline = CompilationPipeline::new(profile, &cli.root);

            match pipeline.build() {
                Ok(compiled) => {
                    println!("OK: {}", compiled.output_path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Lint => {
            let pipeline = CompilationPipeline::new(profile, &cli.root);
            let report = pipeline
                .read_source()
                .and_then(|source| pipeline.lint(&split_lines(&source)));

            match report {
                Ok(report) => match serde_json::to_string_pretty(&report) {
                    Ok(json) => {
                        println!("{}", json);
                        if report.valid {
                            ExitCode::SUCCESS
                        } else {
                            ExitCode::from(2) // Lint failure
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        ExitCode::FAILURE
                    }
                },
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Classify => {
            let pipeline = CompilationPipeline::new(profile, &cli.root);
            let output = pipeline
                .classify()
                .map_err(|e| e.to_string())
                .and_then(|lines| serde_json::to_string_pretty(&lines).map_err(|e| e.to_string()));

            match output {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
