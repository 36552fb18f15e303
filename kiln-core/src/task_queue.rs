//! Work submitted to the simulation thread from other threads.
//!
//! Other threads never touch world state. They hand closures to a
//! [`TaskHandle`]; the world runs them in submission order at the start of
//! its next tick and completes the returned [`TaskFuture`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, ThreadId};

use crossbeam::atomic::AtomicCell;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::world::WorldCore;

/// A queued closure.
pub type Task = Box<dyn FnOnce(&mut WorldCore) + Send>;

/// The world was dropped before the task ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the world was dropped before the task ran")]
pub struct TaskCancelled;

/// Resolves to the value of a submitted task once the simulation thread ran it.
pub struct TaskFuture<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for TaskFuture<T> {
    type Output = Result<T, TaskCancelled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| TaskCancelled))
    }
}

/// The receiving end, owned by the world.
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Task>,
    receiver: mpsc::UnboundedReceiver<Task>,
    owner: Arc<AtomicCell<Option<ThreadId>>>,
}

impl TaskQueue {
    /// Creates an empty queue not yet bound to a thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            owner: Arc::new(AtomicCell::new(None)),
        }
    }

    /// A handle other threads submit through.
    #[must_use]
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            sender: self.sender.clone(),
            owner: Arc::clone(&self.owner),
        }
    }

    /// Makes the calling thread the simulation thread.
    pub fn bind_current_thread(&self) {
        self.owner.store(Some(thread::current().id()));
    }

    /// Whether the caller runs on the simulation thread. Always true before
    /// a thread has been bound.
    #[must_use]
    pub fn is_on_simulation_thread(&self) -> bool {
        on_owner(&self.owner)
    }

    /// The next queued task, if any.
    pub fn pop(&mut self) -> Option<Task> {
        self.receiver.try_recv().ok()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Submits work to the simulation thread. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct TaskHandle {
    sender: mpsc::UnboundedSender<Task>,
    owner: Arc<AtomicCell<Option<ThreadId>>>,
}

impl TaskHandle {
    /// Queues `task` and returns a future of its result.
    pub fn submit<T, F>(&self, task: F) -> TaskFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorldCore) -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.execute(move |world| {
            // The caller may have stopped waiting.
            let _ = sender.send(task(world));
        });
        TaskFuture { receiver }
    }

    /// Queues `task` without waiting for it. Returns `false` if the world is gone.
    pub fn execute<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut WorldCore) + Send + 'static,
    {
        self.sender.send(Box::new(task)).is_ok()
    }

    /// Whether the caller runs on the simulation thread.
    #[must_use]
    pub fn is_on_simulation_thread(&self) -> bool {
        on_owner(&self.owner)
    }
}

fn on_owner(owner: &AtomicCell<Option<ThreadId>>) -> bool {
    owner.load().is_none_or(|id| id == thread::current().id())
}
