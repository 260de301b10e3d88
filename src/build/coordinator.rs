//! Build coordinator - orchestrates the incremental parallel build
//!
//! The coordinator is single-threaded; only the worker pool fans out. It:
//! - creates the object and output directories
//! - runs the optional data-preparation step
//! - evaluates staleness for every source in the manifest
//! - dispatches one compile task per stale source to the worker pool
//! - blocks on the queue's join barrier (the sole synchronization point
//!   between the compile and link phases)
//! - aggregates compile failures and refuses to link if any occurred
//! - runs the link invocation with a deterministic, manifest-ordered
//!   argument list
//! - captures the phase instants for reporting

use crate::build::queue::{CompileTask, WorkQueue};
use crate::build::worker::{Worker, WorkerStats};
use crate::config::BuildConfig;
use crate::error::{BuildError, CompileFailure, Result};
use crate::manifest::Project;
use crate::staleness::{self, ObjectArtifact};
use crate::toolchain::invoke::{describe_status, run_tool};
use crate::toolchain::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Result of a completed build
#[derive(Debug)]
pub struct BuildResult {
    /// Sources listed in the manifest
    pub considered: usize,

    /// Sources whose artifacts were already up to date
    pub up_to_date: usize,

    /// Sources recompiled this run
    pub compiled: usize,

    /// Linked output bundle path
    pub output: PathBuf,

    /// Time spent in the compile phase (dispatch through join)
    pub compile_duration: Duration,

    /// Time spent in the link phase
    pub link_duration: Duration,

    /// Total wall-clock time
    pub total_duration: Duration,
}

/// Snapshot of compile-phase progress for display
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileProgress {
    /// Tasks finished so far (success or failure)
    pub finished: u64,

    /// Tasks that failed so far
    pub failed: u64,

    /// Tasks dispatched this run
    pub total: u64,
}

/// Coordinates the incremental parallel build
pub struct BuildCoordinator {
    config: BuildConfig,
    project: Project,
    toolchain: Arc<Toolchain>,
    stats: Arc<WorkerStats>,
    shutdown: Arc<AtomicBool>,
}

impl BuildCoordinator {
    /// Create a new coordinator
    pub fn new(config: BuildConfig, project: Project, toolchain: Toolchain) -> Self {
        Self {
            config,
            project,
            toolchain: Arc::new(toolchain),
            stats: Arc::new(WorkerStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag a signal handler can set to abort the build
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// The project being built
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Run the full build: compile everything stale, then link
    pub fn run(&self) -> Result<BuildResult> {
        fs::create_dir_all(&self.config.obj_dir)?;
        fs::create_dir_all(&self.config.out_dir)?;

        if self.config.build_data {
            self.run_data_step()?;
        }

        let start = Instant::now();

        // Staleness evaluation over the whole manifest, declaration order
        let artifacts: Vec<ObjectArtifact> = self
            .project
            .sources
            .iter()
            .map(|s| staleness::evaluate(s, &self.config.obj_dir, self.config.force_rebuild))
            .collect();

        let stale: Vec<usize> = artifacts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.needs_rebuild)
            .map(|(i, _)| i)
            .collect();

        info!(
            "{} of {} source file(s) need rebuilding",
            stale.len(),
            artifacts.len()
        );

        self.stats
            .dispatched
            .store(stale.len() as u64, Ordering::Relaxed);

        let mut queue = WorkQueue::new();
        for &i in &stale {
            let source = &self.project.sources[i];
            let artifact = &artifacts[i];
            queue.push(CompileTask {
                source: source.path.clone(),
                object: artifact.path.clone(),
                args: self.compile_args(&source.path, &artifact.path),
            });
        }
        queue.close();

        let failures: Arc<Mutex<Vec<CompileFailure>>> = Arc::default();
        let mut workers = Vec::with_capacity(self.config.jobs);
        for id in 0..self.config.jobs {
            workers.push(
                Worker::spawn(
                    id,
                    Arc::clone(&self.toolchain),
                    queue.receiver(),
                    Arc::clone(&self.stats),
                    Arc::clone(&failures),
                    Arc::clone(&self.shutdown),
                )
                .map_err(BuildError::Worker)?,
            );
        }

        // The join barrier: every dispatched task has been popped and
        // marked done once this returns
        queue.join();
        let compile_end = Instant::now();

        for worker in workers {
            worker.join().map_err(BuildError::Worker)?;
        }

        if self.shutdown.load(Ordering::SeqCst) {
            return Err(BuildError::Interrupted);
        }

        let failures = failures.lock().expect("failure list poisoned").clone();
        if !failures.is_empty() {
            error!("{} compile task(s) failed:", failures.len());
            for failure in &failures {
                error!("  {}: {}", failure.source.display(), failure.detail);
            }
            return Err(BuildError::CompileFailed {
                failed: failures.len(),
                dispatched: stale.len(),
            });
        }

        // Link every artifact - rebuilt and previously up to date alike -
        // in manifest order
        info!("Linking...");
        let output = self.output_path();
        let args = self.link_args(&artifacts, &output);
        let status = run_tool("emcc", &self.toolchain.emcc, &args, None)?;
        if !status.success() {
            return Err(BuildError::LinkFailed {
                detail: describe_status(status),
            });
        }
        let link_end = Instant::now();

        Ok(BuildResult {
            considered: artifacts.len(),
            up_to_date: artifacts.len() - stale.len(),
            compiled: stale.len(),
            output,
            compile_duration: compile_end - start,
            link_duration: link_end - compile_end,
            total_duration: link_end - start,
        })
    }

    /// Run the build while feeding progress snapshots to a callback
    pub fn run_with_progress<F>(&self, callback: F) -> Result<BuildResult>
    where
        F: Fn(CompileProgress) + Send + 'static,
    {
        let stats = Arc::clone(&self.stats);
        let done = Arc::new(AtomicBool::new(false));

        let poll_handle = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    callback(CompileProgress {
                        finished: stats.finished(),
                        failed: stats.failed.load(Ordering::Relaxed),
                        total: stats.dispatched.load(Ordering::Relaxed),
                    });
                    thread::sleep(Duration::from_millis(100));
                }
            })
        };

        let result = self.run();

        done.store(true, Ordering::SeqCst);
        let _ = poll_handle.join();

        result
    }

    /// Argument vector for one compile invocation.
    ///
    /// Shape: `<source> -c -o <object> -std=<std> -I<dir>... -include <hdr>`.
    /// The order is fixed so two runs over the same manifest produce
    /// byte-identical invocations.
    fn compile_args(&self, source: &Path, object: &Path) -> Vec<String> {
        let manifest = &self.project.manifest;
        let mut args = vec![
            source.display().to_string(),
            "-c".to_string(),
            "-o".to_string(),
            object.display().to_string(),
            format!("-std={}", manifest.std),
        ];
        for dir in &manifest.include_dirs {
            args.push(format!("-I{}", self.project.root.join(dir).display()));
        }
        if let Some(header) = &manifest.force_include {
            args.push("-include".to_string());
            args.push(self.project.root.join(header).display().to_string());
        }
        args
    }

    /// Full link argument list: every artifact in manifest order, the
    /// output bundle, the project's link flags, and the preload directive
    fn link_args(&self, artifacts: &[ObjectArtifact], output: &Path) -> Vec<String> {
        let manifest = &self.project.manifest;
        let mut args: Vec<String> = artifacts
            .iter()
            .map(|a| a.path.display().to_string())
            .collect();
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.extend(manifest.link_args.iter().cloned());
        if let Some(dir) = &manifest.preload_dir {
            args.push("--preload-file".to_string());
            args.push(self.project.root.join(dir).display().to_string());
        }
        args
    }

    /// Output bundle path: `<out_dir>/<name>.html`
    fn output_path(&self) -> PathBuf {
        self.config
            .out_dir
            .join(format!("{}.html", self.project.manifest.name))
    }

    /// Run the project's external data-preparation command
    fn run_data_step(&self) -> Result<()> {
        let command = match &self.project.manifest.data_command {
            Some(command) if !command.is_empty() => command,
            Some(_) | None => {
                return Err(BuildError::DataPrepFailed {
                    detail: "manifest defines no data_command".to_string(),
                })
            }
        };

        info!("Preparing data...");
        let (program, args) = (&command[0], &command[1..]);
        let status = run_tool(program, Path::new(program), args, Some(&self.project.root))
            .map_err(|e| BuildError::DataPrepFailed {
                detail: e.to_string(),
            })?;

        if !status.success() {
            return Err(BuildError::DataPrepFailed {
                detail: describe_status(status),
            });
        }

        debug!("Data preparation finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ProjectManifest, TrackedFile};
    use std::time::SystemTime;

    fn fixture_project(sources: &[&str]) -> Project {
        let manifest: ProjectManifest = serde_json::from_str(&format!(
            r#"{{
                "name": "demo",
                "sources": {},
                "include_dirs": ["externals/stb"],
                "force_include": "src/Globals.h",
                "preload_dir": "emscripten_data"
            }}"#,
            serde_json::to_string(sources).unwrap()
        ))
        .unwrap();

        let tracked = sources
            .iter()
            .map(|s| TrackedFile {
                path: PathBuf::from("proj").join(s),
                mtime: SystemTime::UNIX_EPOCH,
            })
            .collect();

        Project {
            manifest,
            root: PathBuf::from("proj"),
            sources: tracked,
            headers: Vec::new(),
        }
    }

    fn fixture_coordinator(project: Project) -> BuildCoordinator {
        let config = BuildConfig {
            manifest_path: PathBuf::from("proj/project.json"),
            obj_dir: PathBuf::from("emscripten_obj"),
            out_dir: PathBuf::from("html"),
            jobs: 2,
            force_rebuild: false,
            build_data: false,
            compiler_override: None,
            show_progress: false,
            verbose: false,
        };
        let toolchain = Toolchain {
            emcc: PathBuf::from("/fake/emcc"),
        };
        BuildCoordinator::new(config, project, toolchain)
    }

    fn fixture_artifacts(paths: &[&str]) -> Vec<ObjectArtifact> {
        paths
            .iter()
            .map(|p| ObjectArtifact {
                path: PathBuf::from(p),
                mtime: None,
                needs_rebuild: true,
            })
            .collect()
    }

    #[test]
    fn test_compile_args_shape() {
        let coordinator = fixture_coordinator(fixture_project(&["src/GUI.cpp"]));
        let args = coordinator.compile_args(
            Path::new("proj/src/GUI.cpp"),
            Path::new("emscripten_obj/GUI.o"),
        );

        assert_eq!(
            args,
            vec![
                "proj/src/GUI.cpp",
                "-c",
                "-o",
                "emscripten_obj/GUI.o",
                "-std=c++20",
                "-Iproj/externals/stb",
                "-include",
                "proj/src/Globals.h",
            ]
        );
    }

    #[test]
    fn test_compile_args_deterministic() {
        let coordinator = fixture_coordinator(fixture_project(&["src/GUI.cpp"]));
        let first = coordinator.compile_args(
            Path::new("proj/src/GUI.cpp"),
            Path::new("emscripten_obj/GUI.o"),
        );
        let second = coordinator.compile_args(
            Path::new("proj/src/GUI.cpp"),
            Path::new("emscripten_obj/GUI.o"),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_link_args_manifest_order() {
        let coordinator =
            fixture_coordinator(fixture_project(&["src/z.cpp", "src/a.cpp", "src/m.cpp"]));
        let artifacts = fixture_artifacts(&[
            "emscripten_obj/z.o",
            "emscripten_obj/a.o",
            "emscripten_obj/m.o",
        ]);

        let args = coordinator.link_args(&artifacts, Path::new("html/demo.html"));

        // Artifacts first, manifest order, never sorted
        assert_eq!(
            &args[..3],
            &["emscripten_obj/z.o", "emscripten_obj/a.o", "emscripten_obj/m.o"]
        );
        assert_eq!(&args[3..5], &["-o", "html/demo.html"]);
        assert!(args.contains(&"-sWASM=1".to_string()));
        let preload_at = args.iter().position(|a| a == "--preload-file").unwrap();
        assert_eq!(args[preload_at + 1], "proj/emscripten_data");
    }

    #[test]
    fn test_link_args_include_every_artifact() {
        // Linking is never partial: fresh artifacts appear alongside
        // rebuilt ones
        let coordinator = fixture_coordinator(fixture_project(&["src/a.cpp", "src/b.cpp"]));
        let mut artifacts = fixture_artifacts(&["emscripten_obj/a.o", "emscripten_obj/b.o"]);
        artifacts[1].needs_rebuild = false;

        let args = coordinator.link_args(&artifacts, Path::new("html/demo.html"));
        assert!(args.contains(&"emscripten_obj/a.o".to_string()));
        assert!(args.contains(&"emscripten_obj/b.o".to_string()));
    }

    #[test]
    fn test_output_path_from_project_name() {
        let coordinator = fixture_coordinator(fixture_project(&["src/a.cpp"]));
        assert_eq!(coordinator.output_path(), PathBuf::from("html/demo.html"));
    }

    #[test]
    fn test_data_step_without_command_fails() {
        let mut project = fixture_project(&["src/a.cpp"]);
        project.manifest.data_command = None;
        let coordinator = fixture_coordinator(project);

        assert!(matches!(
            coordinator.run_data_step(),
            Err(BuildError::DataPrepFailed { .. })
        ));
    }
}
