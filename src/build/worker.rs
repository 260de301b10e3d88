//! Worker threads for the compile phase
//!
//! Each worker loops: pop a task, run the external compile invocation
//! synchronously (the thread is occupied for the process's entire
//! lifetime), record the outcome, mark the task done. Exit statuses are
//! captured per task and failures aggregated for the coordinator; a
//! failing compile never goes unnoticed.
//!
//! When the shutdown flag is set, workers keep draining the queue without
//! invoking the compiler - every popped task is still marked done, so the
//! coordinator's join barrier cannot hang on an aborted build. Threads
//! exit once the queue is closed and empty.

use crate::build::queue::TaskReceiver;
use crate::error::{CompileFailure, WorkerError};
use crate::toolchain::invoke::{describe_status, run_tool};
use crate::toolchain::Toolchain;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Compile-phase statistics, shared across the whole pool
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks dispatched this run (set once by the coordinator)
    pub dispatched: AtomicU64,

    /// Successful compile invocations
    pub compiled: AtomicU64,

    /// Failed compile invocations
    pub failed: AtomicU64,

    /// Tasks drained without compiling after an interrupt
    pub skipped: AtomicU64,
}

impl WorkerStats {
    fn record_compiled(&self) {
        self.compiled.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Tasks that have finished, successfully or not
    pub fn finished(&self) -> u64 {
        self.compiled.load(Ordering::Relaxed)
            + self.failed.load(Ordering::Relaxed)
            + self.skipped.load(Ordering::Relaxed)
    }
}

/// A worker thread that processes compile tasks
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        toolchain: Arc<Toolchain>,
        queue: TaskReceiver,
        stats: Arc<WorkerStats>,
        failures: Arc<Mutex<Vec<CompileFailure>>>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name(format!("compile-{}", id))
            .spawn(move || worker_loop(id, toolchain, queue, stats, failures, shutdown))
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| WorkerError::Panicked { id: self.id })?;
        }
        Ok(())
    }
}

fn worker_loop(
    id: usize,
    toolchain: Arc<Toolchain>,
    queue: TaskReceiver,
    stats: Arc<WorkerStats>,
    failures: Arc<Mutex<Vec<CompileFailure>>>,
    shutdown: Arc<AtomicBool>,
) {
    debug!("Worker {} started", id);

    while let Some(task) = queue.recv() {
        if shutdown.load(Ordering::Relaxed) {
            stats.record_skipped();
            queue.mark_done();
            continue;
        }

        debug!("Worker {} compiling {}", id, task.source.display());

        match run_tool("emcc", &toolchain.emcc, &task.args, None) {
            Ok(status) if status.success() => stats.record_compiled(),
            Ok(status) => {
                let detail = describe_status(status);
                error!("Compile failed for {}: {}", task.source.display(), detail);
                stats.record_failed();
                failures
                    .lock()
                    .expect("failure list poisoned")
                    .push(CompileFailure {
                        source: task.source.clone(),
                        detail,
                    });
            }
            Err(e) => {
                let detail = format!("failed to start compiler: {}", e);
                error!("Compile failed for {}: {}", task.source.display(), detail);
                stats.record_failed();
                failures
                    .lock()
                    .expect("failure list poisoned")
                    .push(CompileFailure {
                        source: task.source.clone(),
                        detail,
                    });
            }
        }

        queue.mark_done();
    }

    debug!("Worker {} finished", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::queue::{CompileTask, WorkQueue};
    use std::path::PathBuf;

    fn pool_fixture(
        toolchain: Toolchain,
        jobs: usize,
        tasks: Vec<CompileTask>,
    ) -> (Arc<WorkerStats>, Vec<CompileFailure>) {
        let mut queue = WorkQueue::new();
        for t in tasks {
            queue.push(t);
        }
        queue.close();

        let toolchain = Arc::new(toolchain);
        let stats = Arc::new(WorkerStats::default());
        let failures: Arc<Mutex<Vec<CompileFailure>>> = Arc::default();
        let shutdown = Arc::new(AtomicBool::new(false));

        let workers: Vec<_> = (0..jobs)
            .map(|id| {
                Worker::spawn(
                    id,
                    Arc::clone(&toolchain),
                    queue.receiver(),
                    Arc::clone(&stats),
                    Arc::clone(&failures),
                    Arc::clone(&shutdown),
                )
                .unwrap()
            })
            .collect();

        queue.join();
        for w in workers {
            w.join().unwrap();
        }

        let failures = failures.lock().unwrap().clone();
        (stats, failures)
    }

    #[test]
    #[cfg(unix)]
    fn test_workers_record_success() {
        let toolchain = Toolchain::with_compiler(PathBuf::from("/bin/true")).unwrap();
        let tasks = (0..6)
            .map(|i| CompileTask {
                source: PathBuf::from(format!("t{i}.cpp")),
                object: PathBuf::from(format!("t{i}.o")),
                args: vec![],
            })
            .collect();

        let (stats, failures) = pool_fixture(toolchain, 3, tasks);
        assert_eq!(stats.compiled.load(Ordering::Relaxed), 6);
        assert_eq!(stats.failed.load(Ordering::Relaxed), 0);
        assert!(failures.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_workers_capture_failures() {
        let toolchain = Toolchain::with_compiler(PathBuf::from("/bin/false")).unwrap();
        let tasks = (0..4)
            .map(|i| CompileTask {
                source: PathBuf::from(format!("t{i}.cpp")),
                object: PathBuf::from(format!("t{i}.o")),
                args: vec![],
            })
            .collect();

        let (stats, failures) = pool_fixture(toolchain, 2, tasks);
        assert_eq!(stats.failed.load(Ordering::Relaxed), 4);
        assert_eq!(failures.len(), 4);
        assert!(failures[0].detail.contains("exit code"));
    }

    #[test]
    #[cfg(unix)]
    fn test_shutdown_drains_without_compiling() {
        let toolchain = Arc::new(Toolchain::with_compiler(PathBuf::from("/bin/true")).unwrap());
        let mut queue = WorkQueue::new();
        for i in 0..10 {
            queue.push(CompileTask {
                source: PathBuf::from(format!("t{i}.cpp")),
                object: PathBuf::from(format!("t{i}.o")),
                args: vec![],
            });
        }
        queue.close();

        let stats = Arc::new(WorkerStats::default());
        let failures: Arc<Mutex<Vec<CompileFailure>>> = Arc::default();
        let shutdown = Arc::new(AtomicBool::new(true));

        let worker = Worker::spawn(
            0,
            toolchain,
            queue.receiver(),
            Arc::clone(&stats),
            failures,
            shutdown,
        )
        .unwrap();

        // Join must not hang even though nothing was compiled
        queue.join();
        worker.join().unwrap();

        assert_eq!(stats.compiled.load(Ordering::Relaxed), 0);
        assert_eq!(stats.skipped.load(Ordering::Relaxed), 10);
    }
}
