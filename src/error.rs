//! Error types for wasmake
//!
//! This module defines the error hierarchy for the build orchestrator:
//! - Toolchain discovery errors (fatal, before any work starts)
//! - Project manifest errors (fatal, before any work starts)
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Aggregated compile/link failures
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - External tool exit statuses are captured and surfaced, never discarded

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the build orchestrator
#[derive(Error, Debug)]
pub enum BuildError {
    /// Project manifest errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Toolchain discovery errors
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (directory creation, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more compile tasks failed; the build refuses to link
    #[error("{failed} of {dispatched} compile task(s) failed")]
    CompileFailed { failed: usize, dispatched: usize },

    /// The link invocation exited with a failure
    #[error("Link step failed: {detail}")]
    LinkFailed { detail: String },

    /// The data-preparation command could not run or exited with a failure
    #[error("Data preparation failed: {detail}")]
    DataPrepFailed { detail: String },

    /// Interrupted by signal
    #[error("Build interrupted by signal")]
    Interrupted,
}

/// Toolchain discovery errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// SDK environment variable is missing
    #[error("{var} environment variable not found: run 'emsdk activate' before building")]
    EnvNotSet { var: &'static str },

    /// The compiler driver is not where the SDK root says it should be
    #[error("Cannot find emcc (looked for '{path}')")]
    CompilerNotFound { path: PathBuf },
}

/// Project manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file missing or unreadable
    #[error("Cannot read project manifest '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Manifest is not valid JSON or fails the schema
    #[error("Malformed project manifest '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// A file listed in the manifest could not be stat'ed
    #[error("Cannot stat '{path}' listed in the manifest: {reason}")]
    StatFailed { path: PathBuf, reason: String },

    /// Manifest lists no translation units at all
    #[error("Manifest lists no source files")]
    NoSources,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid parallel job count
    #[error("Invalid job count {count}: must be between 1 and {max}")]
    InvalidJobs { count: usize, max: usize },

    /// Manifest path given on the command line does not exist
    #[error("Project manifest '{path}' does not exist")]
    ManifestNotFound { path: PathBuf },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },
}

/// Record of a single failed compile task
///
/// Collected by the workers and reported in full after the compile phase;
/// any entry here aborts the build before the link step.
#[derive(Debug, Clone)]
pub struct CompileFailure {
    /// Source file whose compile invocation failed
    pub source: PathBuf,

    /// What went wrong: "exit code N", "terminated by signal", or a
    /// spawn error description
    pub detail: String,
}

/// Result type alias for BuildError
pub type Result<T> = std::result::Result<T, BuildError>;
