//! The compile-dispatch engine
//!
//! A producer (the coordinator) enumerates stale translation units into a
//! counted work queue; a fixed pool of workers consumes them in any order;
//! the queue's join barrier serializes the transition from "all compiles
//! done" to the link step despite unordered concurrent completion.

pub mod coordinator;
pub mod queue;
pub mod worker;

pub use coordinator::{BuildCoordinator, BuildResult, CompileProgress};
pub use queue::{CompileTask, WorkQueue};
pub use worker::{Worker, WorkerStats};
