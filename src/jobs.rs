//! Fire-and-forget job submission.
//!
//! The webhook handler hands [`DispatchJob`]s to a [`JobSubmitter`] and
//! returns without waiting. In production that is a [`JobQueue`]: an
//! unbounded channel drained by a fixed pool of tokio workers, each running
//! jobs through a [`JobRunner`].

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{error, info};

use crate::error::{GraphError, QueueError};

/// What the agent should do with the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTag {
    Summary,
    Walkthrough,
    /// Free-form request from a comment.
    Unspecified,
}

impl ActionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Walkthrough => "walkthrough",
            Self::Unspecified => "N/A",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation of the remote agent graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchJob {
    pub instruction: String,
    /// Pull request or issue number.
    pub number: u64,
    pub repository: String,
    pub tag: ActionTag,
}

pub trait JobSubmitter: Send + Sync {
    /// Schedules `job` without waiting for it to run.
    fn submit(&self, job: DispatchJob) -> Result<(), QueueError>;
}

#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job: &DispatchJob) -> Result<(), GraphError>;
}

#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<DispatchJob>,
}

impl JobSubmitter for JobQueue {
    fn submit(&self, job: DispatchJob) -> Result<(), QueueError> {
        self.sender.send(job).map_err(|_| QueueError::Closed)
    }
}

/// Handles of the workers draining a [`JobQueue`].
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Spawns `worker_count` workers and returns the queue feeding them.
    ///
    /// Workers exit once every clone of the queue is dropped and the
    /// remaining jobs are drained. A worker that panics is restarted.
    pub fn start<R: JobRunner>(runner: Arc<R>, worker_count: usize) -> (Self, WorkerPool) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..worker_count)
            .map(|worker_id| {
                let runner = runner.clone();
                let receiver = receiver.clone();
                tokio::spawn(supervise(worker_id, runner, receiver))
            })
            .collect();

        (Self { sender }, WorkerPool { handles })
    }
}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every worker to finish its last job and exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "dispatch supervisor failed");
            }
        }
    }

    /// Like [`WorkerPool::join`], but gives up as soon as `abort` completes.
    ///
    /// Returns false if the remaining jobs were abandoned.
    pub async fn join_until(self, abort: impl Future<Output = ()>) -> bool {
        tokio::select! {
            () = self.join() => true,
            () = abort => false,
        }
    }
}

async fn supervise<R: JobRunner>(
    worker_id: usize,
    runner: Arc<R>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<DispatchJob>>>,
) {
    loop {
        info!(worker_id, "dispatch worker starting");
        let worker = tokio::spawn(work(worker_id, runner.clone(), receiver.clone()));

        match worker.await {
            Ok(()) => {
                info!(worker_id, "dispatch worker stopped");
                break;
            }
            Err(e) if e.is_panic() => {
                error!(worker_id, error = %e, "dispatch worker panicked, restarting");
            }
            Err(e) => {
                error!(worker_id, error = %e, "dispatch worker cancelled");
                break;
            }
        }
    }
}

async fn work<R: JobRunner>(
    worker_id: usize,
    runner: Arc<R>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<DispatchJob>>>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        info!(
            worker_id,
            repo = %job.repository,
            number = job.number,
            tag = %job.tag,
            "running dispatch job"
        );

        if let Err(e) = runner.run(&job).await {
            error!(
                worker_id,
                repo = %job.repository,
                number = job.number,
                tag = %job.tag,
                error = %e,
                "dispatch job failed"
            );
        }
    }
}
