//! wasmake - Parallel Incremental Emscripten Build Orchestrator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wasmake::config::{BuildConfig, CliArgs};
use wasmake::progress::{print_header, print_summary, ProgressReporter};
use wasmake::{BuildCoordinator, Project, Toolchain};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = BuildConfig::from_args(args).context("Invalid configuration")?;

    // Read the project manifest
    let project =
        Project::read(&config.manifest_path).context("Failed to read project manifest")?;

    // Locate the toolchain before any work starts
    let toolchain = match &config.compiler_override {
        Some(path) => Toolchain::with_compiler(path.clone()),
        None => Toolchain::discover(),
    }
    .context("Failed to locate the Emscripten toolchain")?;

    // Print header
    if config.show_progress {
        print_header(
            &project.manifest.name,
            project.sources.len(),
            config.jobs,
            &toolchain.emcc.display().to_string(),
        );
    }

    let show_progress = config.show_progress;
    let coordinator = BuildCoordinator::new(config, project, toolchain);

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, aborting build...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Run the build
    let result = if show_progress {
        let reporter = Arc::new(ProgressReporter::new());
        reporter.set_status("Evaluating staleness...");

        let result = {
            let reporter = Arc::clone(&reporter);
            coordinator.run_with_progress(move |progress| reporter.update(&progress))
        };

        match &result {
            Ok(_) => reporter.finish_and_clear(),
            Err(_) => reporter.finish("Build failed"),
        }
        result
    } else {
        coordinator.run()
    }
    .context("Build failed")?;

    // Print summary
    if show_progress {
        print_summary(&result);
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("wasmake=debug,warn")
    } else {
        EnvFilter::new("wasmake=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
