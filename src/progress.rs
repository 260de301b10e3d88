//! Progress reporting and build summaries
//!
//! Provides the live compile-phase display using an indicatif spinner,
//! the console-styled header/summary around a build, and the
//! human-readable duration formatter.

use crate::build::coordinator::{BuildResult, CompileProgress};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays compile-phase status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &CompileProgress) {
        let mut msg = format!("Compiling {}/{}", progress.finished, progress.total);
        if progress.failed > 0 {
            msg.push_str(&format!(" | Failed: {}", progress.failed));
        }
        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format an elapsed duration as "Xh Ym Zs", omitting the hour component
/// when it is zero
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else {
        format!("{:02}m {:02}s", minutes, seconds)
    }
}

/// Print a header at the start of the build
pub fn print_header(project: &str, sources: usize, jobs: usize, emcc: &str) {
    println!();
    println!(
        "{} {}",
        style("wasmake").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Project:").bold(), project);
    println!("  {} {}", style("Sources:").bold(), sources);
    println!("  {} {}", style("Jobs:").bold(), jobs);
    println!("  {} {}", style("Compiler:").bold(), emcc);
    println!();
}

/// Print a summary of the build results
pub fn print_summary(result: &BuildResult) {
    println!();
    println!("{}", style("Build Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} ({} up to date)",
        style("Sources:").bold(),
        result.considered,
        result.up_to_date
    );
    println!(
        "  {} {} file(s) in {}",
        style("Compiled:").bold(),
        result.compiled,
        format_duration(result.compile_duration)
    );
    println!(
        "  {} {}",
        style("Linked in:").bold(),
        format_duration(result.link_duration)
    );
    println!(
        "  {} {}",
        style("Total:").bold(),
        format_duration(result.total_duration)
    );
    println!(
        "  {} {}",
        style("Output:").bold(),
        result.output.display()
    );
    println!();
}
