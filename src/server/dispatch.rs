//! # Despacho de Trabajo
//! src/server/dispatch.rs
//!
//! Pool fijo de workers alimentado por una cola FIFO (Mutex + Condvar).
//! Cada trabajo enviado corre exactamente una vez en algún worker, sin
//! garantía de orden respecto de los demás.

use crate::error::InitError;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Trabajo enviado a un worker
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Contrato de envío de trabajo
pub trait Dispatcher: Send + Sync {
    /// Encola `work`; se ejecuta una sola vez en algún worker
    fn submit(&self, work: Work);
}

enum Message {
    Run(Work),
    Shutdown,
}

struct Queue {
    messages: Mutex<VecDeque<Message>>,
    condvar: Condvar,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, message: Message) {
        self.lock().push_back(message);
        self.condvar.notify_one();
    }

    /// Bloquea hasta que haya un mensaje
    fn pop(&self) -> Message {
        let mut messages = self.lock();
        loop {
            if let Some(message) = messages.pop_front() {
                return message;
            }
            messages = self
                .condvar
                .wait(messages)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Pool de threads de tamaño fijo
pub struct WorkerPool {
    queue: Arc<Queue>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self, InitError> {
        let queue = Arc::new(Queue {
            messages: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        });

        let workers = (0..size)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::Builder::new()
                    .name(format!("worker-{}", i))
                    .spawn(move || Self::worker_loop(i, &queue))
                    .map_err(InitError::Spawn)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { queue, workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    fn worker_loop(id: usize, queue: &Queue) {
        debug!(worker = id, "worker started");

        loop {
            match queue.pop() {
                Message::Run(work) => {
                    // Un panic termina el trabajo, no el worker; el lease del
                    // slot se libera igual al desenrollar
                    if panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
                        error!(worker = id, "submitted work panicked");
                    }
                }
                Message::Shutdown => break,
            }
        }

        debug!(worker = id, "worker stopped");
    }
}

impl Dispatcher for WorkerPool {
    fn submit(&self, work: Work) {
        self.queue.push(Message::Run(work));
    }
}

impl Drop for WorkerPool {
    /// Termina el trabajo ya encolado y luego detiene cada worker
    fn drop(&mut self) {
        for _ in &self.workers {
            self.queue.push(Message::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
