//! SinkHandle - runs one sink on its own worker task

use std::sync::Arc;

use contracts::{ContractError, ReportSink, RunReport};
use observability::record_report_written;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Arc<RunReport>>,
    worker_handle: JoinHandle<Result<(), ContractError>>,
}

impl SinkHandle {
    /// Spawn the worker task for `sink`
    pub fn spawn<S: ReportSink + Send + 'static>(sink: S) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(1);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(sink_worker(sink, rx, worker_name));

        Self {
            name,
            tx,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hand the report to the worker
    pub async fn submit(&self, report: Arc<RunReport>) -> Result<(), ContractError> {
        self.tx
            .send(report)
            .await
            .map_err(|_| ContractError::sink_write(&self.name, "sink worker closed unexpectedly"))
    }

    /// Close the queue and wait for the worker's result
    #[instrument(name = "sink_handle_finish", skip(self), fields(sink = %self.name))]
    pub async fn finish(self) -> Result<(), ContractError> {
        drop(self.tx);
        match self.worker_handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(sink = %self.name, error = ?e, "Worker task panicked");
                Err(ContractError::sink_write(&self.name, format!("worker panicked: {e}")))
            }
        }
    }
}

/// Write every submitted report, then close the sink
///
/// Returns the first error; a failed write does not skip `close`.
#[instrument(name = "sink_worker", skip(sink, rx), fields(sink = %name))]
async fn sink_worker<S: ReportSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<RunReport>>,
    name: String,
) -> Result<(), ContractError> {
    debug!(sink = %name, "Sink worker started");
    let mut first_error = None;

    while let Some(report) = rx.recv().await {
        let result = sink.write(&report).await;
        record_report_written(&name, result.is_ok());
        if let Err(e) = result {
            error!(sink = %name, error = %e, "Write failed");
            first_error.get_or_insert(e);
        }
    }

    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed");
        first_error.get_or_insert(e);
    }

    debug!(sink = %name, "Sink worker stopped");
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        writes: Arc<AtomicU64>,
        closed: Arc<AtomicU64>,
        fail: bool,
    }

    impl ReportSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _report: &RunReport) -> Result<(), ContractError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ContractError::sink_write(&self.name, "disk full"))
            } else {
                Ok(())
            }
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn mock(fail: bool) -> (MockSink, Arc<AtomicU64>, Arc<AtomicU64>) {
        let writes = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: "mock".to_string(),
            writes: Arc::clone(&writes),
            closed: Arc::clone(&closed),
            fail,
        };
        (sink, writes, closed)
    }

    #[tokio::test]
    async fn test_handle_writes_and_closes() {
        let (sink, writes, closed) = mock(false);
        let handle = SinkHandle::spawn(sink);
        assert_eq!(handle.name(), "mock");

        handle.submit(Arc::new(RunReport::default())).await.unwrap();
        handle.finish().await.unwrap();

        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_write_still_closes() {
        let (sink, _, closed) = mock(true);
        let handle = SinkHandle::spawn(sink);

        handle.submit(Arc::new(RunReport::default())).await.unwrap();
        let err = handle.finish().await.unwrap_err();

        assert!(err.to_string().contains("disk full"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
