//! Single-threaded task runners.
//!
//! The context builder splits its state across two execution contexts: a
//! control context that owns profile lifecycle, and a build context that owns
//! the network object graph and serves every request. Each context is a
//! [`SingleThreadTaskRunner`]: one dedicated thread draining a closure queue.
//!
//! Cross-context communication happens only by posting tasks; no state is
//! shared mutably between the two threads.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    tx: Mutex<mpsc::Sender<Task>>,
    thread_id: ThreadId,
    name: String,
}

/// Handle to a dedicated thread that runs posted closures in FIFO order.
///
/// Cloning the handle is cheap; the thread exits once every handle is
/// dropped and the queue has drained. Tasks posted after the thread has
/// exited are silently discarded, which is exactly the behavior a
/// cancelable cross-context post needs.
#[derive(Clone)]
pub struct SingleThreadTaskRunner {
    inner: Arc<Inner>,
}

impl SingleThreadTaskRunner {
    /// Spawn a named runner thread.
    pub fn new(name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Task>();
        let (id_tx, id_rx) = mpsc::channel();

        let thread_name = name.to_string();
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                // The channel send cannot fail: the constructor blocks on the
                // matching recv before returning.
                let _ = id_tx.send(thread::current().id());
                while let Ok(task) = rx.recv() {
                    task();
                }
                tracing::trace!(runner = %thread_name, "task runner exiting");
            })
            .expect("failed to spawn task runner thread");

        let thread_id = id_rx.recv().expect("task runner thread died at startup");

        Self {
            inner: Arc::new(Inner {
                tx: Mutex::new(tx),
                thread_id,
                name: name.to_string(),
            }),
        }
    }

    /// Post a task for asynchronous execution on this runner's thread.
    ///
    /// Returns false if the runner thread has already exited.
    pub fn post_task(&self, task: impl FnOnce() + Send + 'static) -> bool {
        let tx = match self.inner.tx.lock() {
            Ok(tx) => tx,
            Err(_) => return false,
        };
        tx.send(Box::new(task)).is_ok()
    }

    /// True when called from this runner's own thread.
    pub fn belongs_to_current_thread(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }

    /// Runner thread name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Post a task and block the calling thread until this runner has
    /// executed everything queued ahead of it.
    ///
    /// Must not be called from the runner's own thread.
    pub fn post_task_and_wait(&self, task: impl FnOnce() + Send + 'static) {
        assert!(
            !self.belongs_to_current_thread(),
            "post_task_and_wait from the runner's own thread would deadlock"
        );
        let (done_tx, done_rx) = mpsc::channel();
        let posted = self.post_task(move || {
            task();
            let _ = done_tx.send(());
        });
        if posted {
            let _ = done_rx.recv();
        }
    }

    /// Block until all currently queued tasks have run.
    pub fn flush(&self) {
        self.post_task_and_wait(|| {});
    }
}

impl std::fmt::Debug for SingleThreadTaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleThreadTaskRunner")
            .field("name", &self.inner.name)
            .field("thread_id", &self.inner.thread_id)
            .finish()
    }
}
