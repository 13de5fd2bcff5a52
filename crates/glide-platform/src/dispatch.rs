//! Background work and the way its results get back to the UI thread.
//!
//! Workers never touch UI state. They push results into a [`UiQueue`], and
//! the UI thread applies them when it calls `pump`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of threads running blocking jobs (file reads, decodes).
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers. With zero, jobs run inline on the caller.
    pub fn new(threads: usize) -> std::io::Result<Self> {
        if threads == 0 {
            return Ok(Self {
                sender: None,
                threads: Vec::new(),
            });
        }
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(threads);
        for i in 0..threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("glide-worker-{i}"))
                .spawn(move || {
                    loop {
                        let job = receiver.lock().recv();
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    }
                    log::trace!("worker {i} exiting");
                })?;
            handles.push(handle);
        }
        log::debug!("worker pool started with {threads} threads");
        Ok(Self {
            sender: Some(sender),
            threads: handles,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads.len()
    }

    /// Queue `job`. Returns false if the workers are gone and the job was
    /// dropped.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => {
                job();
                true
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets every worker finish its queue and exit.
        self.sender.take();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}

/// Results waiting for the UI thread.
pub struct UiQueue<T> {
    items: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for UiQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for UiQueue<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T> UiQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Apply everything queued so far, in arrival order. The lock is
    /// released before `apply` runs, so `apply` may push again; those items
    /// wait for the next pump.
    pub fn pump(&self, mut apply: impl FnMut(T)) -> usize {
        let batch = std::mem::take(&mut *self.items.lock());
        let n = batch.len();
        for item in batch {
            apply(item);
        }
        n
    }
}
