//! Configuration types for wasmake
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//!
//! The configuration is constructed once at startup and passed by reference
//! into each component; there is no ambient global state.

use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable parallel job count
const MAX_JOBS: usize = 512;

/// Default project manifest filename
const DEFAULT_MANIFEST: &str = "project.json";

/// Default object artifact directory
pub const DEFAULT_OBJ_DIR: &str = "emscripten_obj";

/// Default output bundle directory
pub const DEFAULT_OUT_DIR: &str = "html";

/// Parallel incremental Emscripten build orchestrator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wasmake",
    version,
    about = "Parallel incremental Emscripten build orchestrator",
    long_about = "Reads a JSON project manifest, recompiles the translation units whose \
                  object artifacts are missing or out of date, and links everything into \
                  a web bundle.\n\n\
                  The compiler is discovered through the EMSDK environment variable \
                  (run 'emsdk activate' first) unless --emcc is given.",
    after_help = "EXAMPLES:\n    \
        wasmake\n    \
        wasmake project.json -j 8\n    \
        wasmake --rebuild\n    \
        wasmake --data -v"
)]
pub struct CliArgs {
    /// Project manifest (JSON)
    #[arg(value_name = "MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Recompile every source regardless of staleness
    #[arg(short = 'r', long)]
    pub rebuild: bool,

    /// Run the project's data-preparation command before building
    #[arg(short = 'm', long = "data")]
    pub build_data: bool,

    /// Number of parallel compile jobs
    #[arg(short = 'j', long, default_value_t = default_jobs(), value_name = "NUM")]
    pub jobs: usize,

    /// Directory for object artifacts
    #[arg(long, default_value = DEFAULT_OBJ_DIR, value_name = "DIR")]
    pub obj_dir: PathBuf,

    /// Directory for the linked output bundle
    #[arg(long, default_value = DEFAULT_OUT_DIR, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Explicit compiler path (bypasses EMSDK discovery)
    #[arg(long, value_name = "PATH")]
    pub emcc: Option<PathBuf>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-task compile logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_jobs() -> usize {
    // Compiles are CPU bound, one job per logical core
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Path to the project manifest
    pub manifest_path: PathBuf,

    /// Object artifact directory
    pub obj_dir: PathBuf,

    /// Output bundle directory
    pub out_dir: PathBuf,

    /// Number of worker threads
    pub jobs: usize,

    /// Recompile everything regardless of staleness
    pub force_rebuild: bool,

    /// Run the data-preparation step before building
    pub build_data: bool,

    /// Explicit compiler path overriding EMSDK discovery
    pub compiler_override: Option<PathBuf>,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl BuildConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.jobs == 0 || args.jobs > MAX_JOBS {
            return Err(ConfigError::InvalidJobs {
                count: args.jobs,
                max: MAX_JOBS,
            });
        }

        if !args.manifest.exists() {
            return Err(ConfigError::ManifestNotFound {
                path: args.manifest,
            });
        }

        Ok(Self {
            manifest_path: args.manifest,
            obj_dir: args.obj_dir,
            out_dir: args.out_dir,
            jobs: args.jobs,
            force_rebuild: args.rebuild,
            build_data: args.build_data,
            compiler_override: args.emcc,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn args_for(manifest: PathBuf) -> CliArgs {
        CliArgs {
            manifest,
            rebuild: false,
            build_data: false,
            jobs: 4,
            obj_dir: PathBuf::from(DEFAULT_OBJ_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            emcc: None,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_config() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("project.json");
        File::create(&manifest).unwrap();

        let config = BuildConfig::from_args(args_for(manifest)).unwrap();
        assert_eq!(config.jobs, 4);
        assert!(!config.force_rebuild);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("project.json");
        File::create(&manifest).unwrap();

        let mut args = args_for(manifest);
        args.jobs = 0;
        assert!(matches!(
            BuildConfig::from_args(args),
            Err(ConfigError::InvalidJobs { .. })
        ));
    }

    #[test]
    fn test_excessive_jobs_rejected() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("project.json");
        File::create(&manifest).unwrap();

        let mut args = args_for(manifest);
        args.jobs = 100_000;
        assert!(matches!(
            BuildConfig::from_args(args),
            Err(ConfigError::InvalidJobs { .. })
        ));
    }

    #[test]
    fn test_missing_manifest_rejected() {
        let args = args_for(PathBuf::from("/nonexistent/project.json"));
        assert!(matches!(
            BuildConfig::from_args(args),
            Err(ConfigError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_cli_args_parse() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
