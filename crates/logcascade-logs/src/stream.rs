use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::parser::RecordParser;
use logcascade_types::LogRecord;

/// When a reader hands its pending records over
#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
    /// Send as soon as this many records are pending
    pub max_records: usize,

    /// Send whatever is pending at least this often
    pub flush_interval: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_records: 1000,
            flush_interval: Duration::from_millis(250),
        }
    }
}

/// Manages reader tasks that turn line sources into record batches
pub struct RecordStream {
    /// Cancellation token for stopping readers
    cancel: CancellationToken,

    /// Active reader task handles
    tasks: Vec<tokio::task::JoinHandle<()>>,

    /// Lines read per source
    line_counts: Arc<RwLock<HashMap<String, u64>>>,
}

impl Default for RecordStream {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStream {
    /// Create a new record stream manager
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            line_counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn a reader for one source
    ///
    /// Each batch is sent whole so the receiver can insert every record
    /// before recompiling.
    pub fn spawn_reader<R>(
        &mut self,
        source: impl Into<String>,
        reader: R,
        batch_tx: mpsc::UnboundedSender<Vec<LogRecord>>,
        options: BatchOptions,
    ) where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let source = source.into();
        self.line_counts.write().insert(source.clone(), 0);

        let cancel = self.cancel.clone();
        let line_counts = Arc::clone(&self.line_counts);
        let max_records = options.max_records.max(1);

        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut pending: Vec<LogRecord> = Vec::new();
            let mut flush = tokio::time::interval(options.flush_interval);
            flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,

                    _ = flush.tick() => {
                        if !pending.is_empty() && batch_tx.send(std::mem::take(&mut pending)).is_err() {
                            // Receiver gone, stop reading
                            return;
                        }
                    }

                    result = lines.next_line() => {
                        match result {
                            Ok(Some(line)) => {
                                if let Some(count) = line_counts.write().get_mut(&source) {
                                    *count += 1;
                                }
                                if line.trim().is_empty() {
                                    continue;
                                }
                                pending.push(RecordParser::parse(&line));
                                if pending.len() >= max_records
                                    && batch_tx.send(std::mem::take(&mut pending)).is_err()
                                {
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                tracing::warn!(source = %source, error = %e, "log source read failed");
                                break;
                            }
                        }
                    }
                }
            }

            if !pending.is_empty() {
                let _ = batch_tx.send(pending);
            }
            tracing::debug!(source = %source, "log source finished");
        });

        self.tasks.push(task);
    }

    /// Lines read so far from a source
    pub fn lines_read(&self, source: &str) -> Option<u64> {
        self.line_counts.read().get(source).copied()
    }

    /// Wait for every reader to reach the end of its source
    pub async fn join(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "log reader task failed");
            }
        }
    }

    /// Stop all readers
    pub fn stop(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.cancel = CancellationToken::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reader_sends_batches_until_eof() {
        let input = "INFO:app:one\nWARNING:app.db:two\n\nERROR:web:three\n";
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut stream = RecordStream::new();
        stream.spawn_reader(
            "memory",
            input.as_bytes(),
            tx,
            BatchOptions {
                max_records: 2,
                flush_interval: Duration::from_secs(60),
            },
        );
        stream.join().await;

        let mut batches = Vec::new();
        while let Some(batch) = rx.recv().await {
            batches.push(batch);
        }
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, [2, 1]);
        assert_eq!(batches[0][1].logger, "app.db");
        assert_eq!(stream.lines_read("memory"), Some(4));
    }

    #[tokio::test]
    async fn test_stop_closes_channel() {
        let (client, _server) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut stream = RecordStream::new();
        stream.spawn_reader("pipe", client, tx, BatchOptions::default());

        stream.stop();
        assert!(rx.recv().await.is_none());
    }
}
