//! Deferred task scheduling.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs work after the current call stack has unwound, never inline.
pub trait Scheduler: Send + Sync {
    fn schedule_soon(&self, task: Task);
}

/// Scheduler backed by an unbounded queue. The host drains it from its own
/// loop with [`run_pending`](QueueScheduler::run_pending).
pub struct QueueScheduler {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl QueueScheduler {
    /// Create a scheduler with an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Run the tasks queued before this call. Tasks they schedule wait for
    /// the next drain. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let queued = self.receiver.len();
        let mut ran = 0;
        for _ in 0..queued {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Number of tasks waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for QueueScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for QueueScheduler {
    fn schedule_soon(&self, task: Task) {
        // Both ends live in self, so the channel cannot be disconnected.
        let _ = self.sender.send(task);
    }
}
