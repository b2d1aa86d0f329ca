use std::time::Duration;

use tokio::runtime::{Handle, Runtime};

use crate::assets::request::{self, LoadExecutor, LoadRequest, LoadResponse};
use crate::errors::{AssetError, Error, Result};

/// Runs load requests on a tokio runtime.
///
/// Reads go through `tokio::fs`; decoding is CPU-bound and runs on the
/// blocking pool. Finished responses are queued on a channel and collected
/// by the render thread with [`LoadExecutor::drain`], so the caller never
/// blocks on a load.
pub struct AssetServer {
    runtime: Option<Runtime>,
    handle: Handle,
    tx: flume::Sender<LoadResponse>,
    rx: flume::Receiver<LoadResponse>,
}

impl AssetServer {
    /// Creates a server with its own worker runtime.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("clipview-assets")
            .enable_all()
            .build()
            .map_err(Error::Io)?;
        let handle = runtime.handle().clone();
        let (tx, rx) = flume::unbounded();
        Ok(Self {
            runtime: Some(runtime),
            handle,
            tx,
            rx,
        })
    }

    /// Creates a server that spawns onto an existing runtime.
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            runtime: None,
            handle,
            tx,
            rx,
        }
    }

    /// Blocks until one response arrives or `timeout` elapses.
    ///
    /// For headless tools and tests; the render loop should use `drain`.
    #[must_use]
    pub fn wait_for_response(&self, timeout: Duration) -> Option<LoadResponse> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl LoadExecutor for AssetServer {
    fn submit(&self, request: LoadRequest) {
        let tx = self.tx.clone();
        log::debug!(
            "Submitting {:?} load #{} for '{}'",
            request.role,
            request.token.0,
            request.name
        );
        self.handle.spawn(async move {
            let response = match request.source.read_bytes().await {
                Ok(bytes) => {
                    let task_request = request.clone();
                    match tokio::task::spawn_blocking(move || {
                        request::decode_request(&task_request, &bytes)
                    })
                    .await
                    {
                        Ok(response) => response,
                        Err(e) => request::failed_response(
                            &request,
                            AssetError::TaskFailed(e.to_string()),
                        ),
                    }
                }
                Err(e) => request::failed_response(&request, e),
            };
            // The receiver lives as long as the server.
            let _ = tx.send(response);
        });
    }

    fn drain(&self) -> Vec<LoadResponse> {
        self.rx.try_iter().collect()
    }
}

impl Drop for AssetServer {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
