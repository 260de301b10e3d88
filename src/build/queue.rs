//! Compile task queue with a counting join barrier
//!
//! Transport is an unbounded crossbeam channel; completion tracking is a
//! pending counter behind a mutex/condvar pair. `push` increments the
//! counter before the task enters the channel, a worker calls `mark_done`
//! once its compile invocation has returned, and `join` blocks until the
//! counter reaches zero - that is, until every pushed task has been both
//! popped and completed, under any interleaving across any number of
//! workers.
//!
//! Pop order is unspecified: compile tasks are independent and workers may
//! consume them in any order relative to push order.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};

/// A unit of compile work: one source file, its object artifact, and the
/// full compiler argument vector
#[derive(Debug, Clone)]
pub struct CompileTask {
    /// Translation unit to compile
    pub source: PathBuf,

    /// Object artifact the invocation writes
    pub object: PathBuf,

    /// Complete argument vector for the compiler
    pub args: Vec<String>,
}

/// Pending-task barrier shared between the queue and its receivers
#[derive(Debug, Default)]
struct Pending {
    count: Mutex<usize>,
    zero: Condvar,
}

/// Unordered, blocking multi-producer/multi-consumer queue of compile tasks
pub struct WorkQueue {
    sender: Option<Sender<CompileTask>>,
    receiver: Receiver<CompileTask>,
    pending: Arc<Pending>,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: Some(sender),
            receiver,
            pending: Arc::new(Pending::default()),
        }
    }

    /// Enqueue a task. Never blocks: the channel is unbounded.
    ///
    /// Must not be called after `close`.
    pub fn push(&self, task: CompileTask) {
        {
            let mut count = self.pending.count.lock().expect("pending counter poisoned");
            *count += 1;
        }
        self.sender
            .as_ref()
            .expect("push after close")
            .send(task)
            .expect("receiver cannot disconnect while the queue is alive");
    }

    /// Handle for workers to pop tasks and mark them done
    pub fn receiver(&self) -> TaskReceiver {
        TaskReceiver {
            receiver: self.receiver.clone(),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Close the queue. Once the channel drains, worker pops return None
    /// and their loops exit. Call after the last push.
    pub fn close(&mut self) {
        self.sender.take();
    }

    /// Block until every pushed task has been popped and marked done.
    ///
    /// Returns immediately if nothing is pending.
    pub fn join(&self) {
        let mut count = self.pending.count.lock().expect("pending counter poisoned");
        while *count > 0 {
            count = self
                .pending
                .zero
                .wait(count)
                .expect("pending counter poisoned");
        }
    }

    /// Number of tasks pushed but not yet marked done
    pub fn pending(&self) -> usize {
        *self.pending.count.lock().expect("pending counter poisoned")
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle workers use to pop tasks and report their completion
#[derive(Clone)]
pub struct TaskReceiver {
    receiver: Receiver<CompileTask>,
    pending: Arc<Pending>,
}

impl TaskReceiver {
    /// Pop a task, blocking until one is available.
    ///
    /// Returns None once the queue is closed and drained.
    pub fn recv(&self) -> Option<CompileTask> {
        self.receiver.recv().ok()
    }

    /// Mark a popped task complete.
    ///
    /// Usage contract: call exactly once per popped task, after the
    /// external invocation has returned. A second call for the same task
    /// would corrupt the pending count; this is not guarded at runtime.
    pub fn mark_done(&self) {
        let mut count = self.pending.count.lock().expect("pending counter poisoned");
        debug_assert!(*count > 0, "mark_done without a matching push");
        *count -= 1;
        if *count == 0 {
            self.pending.zero.notify_all();
        }
    }
}
