//! The optimization worker.
//!
//! A worker is a dedicated thread owning a `Dispatcher`. The host talks to
//! it only through messages: requests go in over a bounded channel,
//! responses come back over a second channel, both in FIFO order. Each
//! request is handled to completion before the next one is received, so
//! the worker state needs no locking.
//!
//! There is no way to interrupt a running pass. A host that wants to give
//! up on long-running work drops the `WorkerHandle` and spawns a new worker.

mod dispatcher;
mod messages;

pub use dispatcher::{load, next_pass, process, Dispatcher, WorkerState};
pub use messages::{decode_request, encode_response, Action, Request, Response};

use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::constants::{DEFAULT_CHANNEL_CAPACITY, WORKER_THREAD_NAME};
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;

/// Worker thread configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Requests that may be queued before `send` blocks.
    pub channel_capacity: usize,
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            thread_name: WORKER_THREAD_NAME.to_string(),
        }
    }
}

/// Host-side endpoint of a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    requests: SyncSender<Request>,
    responses: Receiver<Response>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Queues a request. Blocks while the request channel is full.
    pub fn send(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| Error::WorkerDisconnected)
    }

    /// Waits for the next response.
    pub fn recv(&self) -> Result<Response> {
        self.responses.recv().map_err(|_| Error::WorkerDisconnected)
    }

    /// Sends a request and waits for its response. Responses arrive in
    /// request order, so this assumes no other request is outstanding.
    pub fn call(&self, request: Request) -> Result<Response> {
        self.send(request)?;
        self.recv()
    }

    /// Closes the request channel and waits for the worker to exit.
    pub fn shutdown(self) -> Result<()> {
        let WorkerHandle {
            requests,
            responses,
            thread,
        } = self;
        drop(requests);
        drop(responses);
        thread
            .join()
            .map_err(|_| Error::WorkerPanic("worker thread terminated abnormally".to_string()))
    }
}

/// Starts a worker thread serving requests with the given pipeline.
pub fn spawn_worker(pipeline: Pipeline, config: WorkerConfig) -> Result<WorkerHandle> {
    let (request_tx, request_rx) = mpsc::sync_channel(config.channel_capacity);
    let (response_tx, response_rx) = mpsc::channel();

    let dispatcher = Dispatcher::new(pipeline);
    let thread = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || run(dispatcher, request_rx, response_tx))?;

    info!(
        thread = %config.thread_name,
        capacity = config.channel_capacity,
        "worker started"
    );

    Ok(WorkerHandle {
        requests: request_tx,
        responses: response_rx,
        thread,
    })
}

/// Worker loop: one request at a time until the host hangs up.
fn run(mut dispatcher: Dispatcher, requests: Receiver<Request>, responses: Sender<Response>) {
    for request in requests {
        let response = dispatcher.handle(request);
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("worker stopped");
}
