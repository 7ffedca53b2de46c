use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use license_diff::{
    config::Config,
    license::LicenseResolver,
    model::RunReport,
    output::{print_report, project_report_path, write_json, OutputFormat, REPORT_FILE_NAME},
    pipeline::Pipeline,
    reconcile::{consolidate, Reconciler},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const LICENSE_CHANGED: u8 = 2;
}

#[derive(Parser)]
#[command(name = "license-diff")]
#[command(
    author,
    version,
    about = "Compare NuGet and npm dependency licenses between two commits"
)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Error occurred
    2  License changes found (with --fail-on-license-change)")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff dependency licenses for the configured projects
    Run {
        /// Config file (defaults to the user config location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the consolidated JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only process the project with this name
        #[arg(short, long)]
        project: Option<String>,

        /// Keep cloned repositories after the run
        #[arg(long)]
        keep_work: bool,

        /// Exit with code 2 if any license changed
        #[arg(long)]
        fail_on_license_change: bool,
    },

    /// Show or create config file
    Config {
        /// Generate a sample config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Run {
            config,
            format,
            output,
            project,
            keep_work,
            fail_on_license_change,
        } => {
            let config = match config {
                Some(path) => Config::load_from(&path)?,
                None => Config::load()?,
            };

            run_diff(
                config,
                format,
                output,
                project,
                keep_work,
                fail_on_license_change,
            )
            .await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_diff(
    config: Config,
    format: Option<String>,
    output_file: Option<PathBuf>,
    project_filter: Option<String>,
    keep_work: bool,
    fail_on_license_change: bool,
) -> Result<u8> {
    let format_str = format.unwrap_or_else(|| config.default_format.clone());
    let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table;

    let projects = config.select_projects(project_filter.as_deref());
    if projects.is_empty() {
        bail!(
            "No project named '{}' in config",
            project_filter.unwrap_or_default()
        );
    }

    info!("Working directory: {}", config.working_directory.display());
    info!("Output directory: {}", config.output_directory.display());

    let progress = if is_interactive {
        let pb = ProgressBar::new(projects.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Processing projects...")?
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let reconciler = Reconciler::new(LicenseResolver::new(config.nuget_cache_root()));
    let mut pipeline =
        Pipeline::new(&config.working_directory, reconciler).keep_work(keep_work);
    if let Some(pb) = &progress {
        pipeline = pipeline.with_progress(pb.clone());
    }

    let results = pipeline.run(&projects).await;

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Processed {} of {} projects",
            results.len(),
            projects.len()
        ));
    }

    if results.is_empty() {
        bail!("No project could be processed");
    }

    for result in &results {
        let path = project_report_path(&config.output_directory, &result.project_name);
        write_json(&path, result)?;
        info!("Project report written to {}", path.display());
    }

    let consolidated = consolidate(&results);
    let report = RunReport::new(results, consolidated);

    let report_path =
        output_file.unwrap_or_else(|| config.output_directory.join(REPORT_FILE_NAME));
    write_json(&report_path, &report)?;

    print_report(&report, format)?;
    if is_interactive {
        println!();
        println!("Results written to: {}", report_path.display());
    }

    if fail_on_license_change && report.has_license_changes() {
        return Ok(exit_codes::LICENSE_CHANGED);
    }

    Ok(exit_codes::SUCCESS)
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let sample = Config::generate_default_config();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, &sample)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Sample configuration:");
        println!("{}", sample);
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'license-diff config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
