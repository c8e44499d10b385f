//! Record fan-out to registered consumers.

use tracing::{debug, warn};

use crate::Result;
use crate::types::SensorRecord;

/// A consumer of broadcast records.
///
/// Implementations must not block: the broadcaster delivers synchronously on
/// the ingestion path, so a sink needing bounded memory enforces its own
/// eviction rather than applying backpressure.
pub trait RecordSink: Send {
    /// Stable name used for logging and unregistration.
    fn name(&self) -> &str;

    /// Deliver one record. Failures are isolated by the broadcaster: they
    /// never reach other sinks or the ingestion path.
    fn on_record(&mut self, record: &SensorRecord) -> Result<()>;

    /// Finalize at session end (flush, close). Default: nothing to do.
    fn on_session_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fan-out hub delivering each record to every registered sink.
///
/// Delivery is synchronous and in registration order, so for a single
/// `publish` call registration order is also delivery order. A sink that
/// fails is logged and skipped; subsequent sinks still receive the record.
#[derive(Default)]
pub struct RecordBroadcaster {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl RecordBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink at the end of the delivery order.
    pub fn register(&mut self, sink: Box<dyn RecordSink>) {
        debug!(sink = sink.name(), "sink registered");
        self.sinks.push(sink);
    }

    /// Remove and return the first sink with the given name.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn RecordSink>> {
        let index = self.sinks.iter().position(|s| s.name() == name)?;
        debug!(sink = name, "sink unregistered");
        Some(self.sinks.remove(index))
    }

    /// Deliver a record to every registered sink, in registration order.
    ///
    /// Returns the number of sinks that accepted the record. Failures are
    /// logged and swallowed here; the record production path never stalls
    /// because one consumer is broken.
    pub fn publish(&mut self, record: &SensorRecord) -> usize {
        let mut delivered = 0;
        for sink in &mut self.sinks {
            match sink.on_record(record) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(sink = sink.name(), error = %e, "sink rejected record"),
            }
        }
        delivered
    }

    /// Run every sink's finalization hook. Failures are logged and do not
    /// prevent later sinks from finalizing.
    pub fn finish(&mut self) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.on_session_end() {
                warn!(sink = sink.name(), error = %e, "sink finalization failed");
            }
        }
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is registered.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for RecordBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBroadcaster")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}
