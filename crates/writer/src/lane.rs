//! A bounded queue drained by one consumer thread
//!
//! The sender sits behind a read/write lock. Producers hold the read side for
//! the duration of a send, so `close` (which takes the write side) waits for
//! every in-flight producer and nothing can be enqueued after the consumer
//! has been told to stop.

use crate::error_handler::ErrorHandler;
use crate::traits::TextWriter;
use accesslog_core::{Error, LogRecord, Result};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Most records the consumer writes before it considers flushing
const BATCH_LIMIT: usize = 256;

enum Message {
    Record(LogRecord),
    /// Flush the wrapped writer, then acknowledge
    Flush(Sender<()>),
}

pub(crate) struct Lane {
    sender: RwLock<Option<Sender<Message>>>,
    discard: Arc<AtomicBool>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl Lane {
    pub(crate) fn spawn(
        thread_name: String,
        capacity: usize,
        auto_flush: bool,
        wrapped: Arc<dyn TextWriter>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Result<Self> {
        let (sender, receiver) = channel::bounded(capacity.max(1));
        let discard = Arc::new(AtomicBool::new(false));
        let consumer = Consumer {
            receiver,
            wrapped,
            auto_flush,
            discard: Arc::clone(&discard),
            error_handler,
        };
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || consumer.run())
            .map_err(|e| Error::lifecycle(format!("failed to start {thread_name}: {e}")))?;

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            discard,
            consumer: Mutex::new(Some(handle)),
        })
    }

    /// Enqueue, blocking while the queue is full. Hands the record back if
    /// the lane no longer accepts records.
    pub(crate) fn send(&self, record: LogRecord) -> std::result::Result<(), LogRecord> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err(record);
        };
        if let Err(channel::SendError(Message::Record(record))) =
            sender.send(Message::Record(record))
        {
            return Err(record);
        }
        Ok(())
    }

    /// Wait until everything enqueued before this call has been written and
    /// the wrapped writer flushed. Returns false if the lane is closed.
    pub(crate) fn flush(&self) -> bool {
        let (ack, acked) = channel::bounded(1);
        {
            let sender = self.sender.read();
            let Some(sender) = sender.as_ref() else {
                return false;
            };
            if sender.send(Message::Flush(ack)).is_err() {
                return false;
            }
        }
        acked.recv().is_ok()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Stop accepting records and wait for the consumer. With `drain` the
    /// backlog is written; otherwise it is counted and reported as discarded.
    /// Returns false if the lane was already closed.
    pub(crate) fn close(&self, drain: bool) -> bool {
        if !drain {
            self.discard.store(true, Ordering::Release);
        }
        let Some(sender) = self.sender.write().take() else {
            return false;
        };
        drop(sender);
        if let Some(handle) = self.consumer.lock().take() {
            if handle.join().is_err() {
                warn!("access log queue consumer panicked");
            }
        }
        true
    }
}

struct Consumer {
    receiver: Receiver<Message>,
    wrapped: Arc<dyn TextWriter>,
    auto_flush: bool,
    discard: Arc<AtomicBool>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl Consumer {
    fn run(self) {
        let mut discarded = 0usize;
        // keep receiving until every sender is gone so no producer stays
        // blocked on a full queue
        while let Ok(message) = self.receiver.recv() {
            match message {
                Message::Record(record) if self.discard.load(Ordering::Acquire) => {
                    drop(record);
                    discarded += 1;
                }
                Message::Record(record) => {
                    self.wrapped.write_record(record);
                    self.drain_batch(&mut discarded);
                    if self.auto_flush {
                        self.wrapped.flush();
                    }
                }
                Message::Flush(ack) => {
                    self.wrapped.flush();
                    let _ = ack.send(());
                }
            }
        }
        if discarded > 0 {
            self.error_handler
                .records_discarded(self.wrapped.name(), discarded);
        }
    }

    /// Write whatever else is already queued so one flush covers a burst
    fn drain_batch(&self, discarded: &mut usize) {
        for _ in 0..BATCH_LIMIT {
            match self.receiver.try_recv() {
                Ok(Message::Record(record)) => {
                    if self.discard.load(Ordering::Acquire) {
                        *discarded += 1;
                    } else {
                        self.wrapped.write_record(record);
                    }
                }
                Ok(Message::Flush(ack)) => {
                    self.wrapped.flush();
                    let _ = ack.send(());
                }
                Err(_) => return,
            }
        }
    }
}
