//! Runtime Collaborators
//!
//! The kernel owns no threads and no registry. It talks to the outside world
//! through two interfaces:
//!
//! - [`Runtime`]: routing, spawning, retirement and scheduling.
//! - [`Scheduler`]: executes zero-argument units of work later.
//!
//! [`TokioScheduler`] runs jobs on a tokio runtime; [`ManualScheduler`]
//! queues them until the caller drives them, which makes interleavings
//! reproducible in tests.

use crate::config::ActorConfig;
use crate::identity::{ActorId, ActorPid};
use crate::messages::{ActorMessage, MessageOrError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

/// Unit of work handed to a scheduler
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes jobs at some later point, on some thread
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, job: Job);
}

/// Everything an actor needs from its surroundings
///
/// Shared read-only by any number of actors and threads.
pub trait Runtime: Send + Sync + Sized + 'static {
    /// Route `message` from `sender` to `receiver`, locally or remotely
    ///
    /// Never fails at the call site; delivery problems come back to the
    /// sender as [`crate::ActorError`] messages.
    fn dispatch<M: ActorMessage>(&self, sender: ActorPid, receiver: ActorPid, message: MessageOrError<M>);

    /// Create an actor of type `C` seeded with one initial message
    fn spawn<C: ActorConfig>(&self, database: &str, initial_state: C::State, initial_message: C::Message) -> ActorId;

    /// Retire the actor at `pid`
    fn finish(&self, pid: &ActorPid);

    /// Hand a job to the scheduler
    fn schedule(&self, job: Job);
}

/// Runs every job as a task on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime the caller is running in
    ///
    /// Panics outside a tokio runtime, like [`tokio::runtime::Handle::current`].
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Job) {
        // Jobs never block, so running them as plain tasks is fine.
        self.handle.spawn(async move { job() });
    }
}

/// Queues jobs until they are run explicitly
#[derive(Default)]
pub struct ManualScheduler {
    jobs: Mutex<VecDeque<Job>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued jobs
    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Run the oldest queued job. Returns `false` when nothing was queued.
    pub fn run_next(&self) -> bool {
        // Lock released before running: jobs schedule more jobs.
        let job = self.jobs.lock().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run jobs, including ones scheduled meanwhile, until the queue is empty
    pub fn run_until_idle(&self) -> usize {
        let mut executed = 0;
        while self.run_next() {
            executed += 1;
        }
        executed
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
