//! CLI entrypoint for chaosgen.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chaosgen_core::catalog;
use chaosgen_harness::structured_log::LogEmitter;
use chaosgen_harness::{GeneratorConfig, Overrides, listing, pipeline};

/// Combinatorial chaos-scenario generator.
#[derive(Debug, Parser)]
#[command(name = "chaosgen")]
#[command(about = "Generate chaos scenarios from a fault x tier x severity matrix")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one YAML file per selected combination.
    Generate {
        /// Combination strategy: full, pairwise, or pairwise-ipo.
        #[arg(long)]
        strategy: Option<String>,
        /// Output root directory.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Substitute this value for the enclave placeholder in output files.
        #[arg(long)]
        enclave: Option<String>,
        /// JSON matrix configuration (defaults to the built-in catalog).
        #[arg(long)]
        matrix: Option<PathBuf>,
        /// Assembly worker threads.
        #[arg(long)]
        workers: Option<usize>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact manifest JSON path.
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Preview the scenario table without writing files.
    List {
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        matrix: Option<PathBuf>,
    },
    /// Print a JSON 2-way coverage report; fails when coverage is incomplete.
    Coverage {
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        matrix: Option<PathBuf>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the built-in matrix configuration as JSON.
    DumpConfig {
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn run_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("chaosgen-{secs}-{}", std::process::id())
}

fn write_or_print(output: Option<&PathBuf>, text: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            strategy,
            output,
            enclave,
            matrix,
            workers,
            log,
            manifest,
        } => {
            let config = GeneratorConfig::resolve(Overrides {
                strategy,
                output,
                enclave,
                workers,
                matrix,
                log,
                manifest,
            })?;
            let matrix = config.load_matrix()?;
            let combinations = pipeline::select(&matrix, config.strategy)?;
            print!("{}", listing::summary(config.strategy, combinations.len()));
            println!();

            let run_id = run_id();
            let mut emitter = match &config.log_path {
                Some(path) => LogEmitter::to_file(path, &run_id)?,
                None => LogEmitter::discard(&run_id),
            };
            let summary = pipeline::generate(&config, &matrix, &mut emitter)?;
            for file in &summary.written {
                println!("  wrote  {}", file.path.display());
            }
            println!();
            println!(
                "Generated {} scenario(s) in {}/",
                summary.written.len(),
                config.output_root.display()
            );
            if let Some(path) = &config.manifest_path {
                eprintln!("Manifest: {}", path.display());
            }
            if let Some(path) = &config.log_path {
                eprintln!("Log: {}", path.display());
            }
            println!();
            println!(
                "Run one:  ./bin/chaos-runner run --scenario {}/<category>/<name>.yaml --enclave <enclave>",
                config.output_root.display()
            );
        }
        Command::List { strategy, matrix } => {
            let config = GeneratorConfig::resolve(Overrides {
                strategy,
                matrix,
                ..Overrides::default()
            })?;
            let matrix = config.load_matrix()?;
            let rows = pipeline::plan(&matrix, config.strategy)?;
            print!("{}", listing::summary(config.strategy, rows.len()));
            println!();
            print!("{}", listing::render_table(&rows));
        }
        Command::Coverage {
            strategy,
            matrix,
            output,
        } => {
            let config = GeneratorConfig::resolve(Overrides {
                strategy,
                matrix,
                ..Overrides::default()
            })?;
            let matrix = config.load_matrix()?;
            let report = pipeline::coverage(&matrix, config.strategy)?;
            let json = serde_json::to_string_pretty(&report)?;
            write_or_print(output.as_ref(), &json)?;
            eprintln!(
                "{}: {} combination(s), {}/{} pairs ({:.1}%)",
                config.strategy.as_str(),
                report.selected,
                report.covered,
                report.required,
                report.coverage_percent()
            );
            if !report.is_complete() {
                return Err(format!(
                    "{} pair requirement(s) uncovered",
                    report.missing.len()
                )
                .into());
            }
        }
        Command::DumpConfig { output } => {
            let json = serde_json::to_string_pretty(&catalog::polygon_pos())?;
            write_or_print(output.as_ref(), &json)?;
        }
    }

    Ok(())
}
