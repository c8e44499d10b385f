//! Ingestion task driving one session from a transport link.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::interval::IntervalSnapshot;
use crate::session::{ConnectionSession, SessionStatus};
use crate::transport::TransportLink;

/// Runs the single long-lived ingestion loop for one session.
///
/// The loop suspends on the next transport chunk and on the cancellation
/// token simultaneously, so an explicit disconnect takes effect without
/// waiting out a poll interval. The session's reassembler and detector are
/// only ever touched from this task, the single-writer rule that keeps
/// their state free of synchronization.
pub(crate) struct Driver;

impl Driver {
    /// Drive `link` until the stream ends, a transport or framing error
    /// occurs, or `cancel` fires. Consumes the session; its state dies with
    /// this call.
    pub(crate) async fn run<L>(
        mut link: L,
        mut session: ConnectionSession,
        status_tx: watch::Sender<SessionStatus>,
        interval: Arc<Mutex<IntervalSnapshot>>,
        cancel: CancellationToken,
    ) where
        L: TransportLink,
    {
        info!("ingestion task started");
        let mut chunk_count = 0u64;

        let outcome = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("disconnect requested");
                    break Ok(());
                }
                next = link.next_chunk() => next,
            };

            match next {
                Ok(Some(chunk)) => {
                    chunk_count += 1;
                    match session.ingest(&chunk) {
                        Ok(report) if report.zone_changed => {
                            let snapshot = session.interval_snapshot();
                            *interval.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = %e, "ingestion failed, ending session");
                            break Err(e);
                        }
                    }
                }
                Ok(None) => {
                    info!("transport stream ended");
                    break Ok(());
                }
                Err(e) => {
                    // No retry here: reconnect policy belongs to the caller
                    // issuing connect requests.
                    error!(error = %e, "transport error, ending session");
                    break Err(e);
                }
            }
        };

        status_tx.send_replace(SessionStatus::Disconnecting);
        session.finish();
        if let Err(e) = link.disconnect().await {
            warn!(error = %e, "link teardown failed");
        }

        info!(
            chunks = chunk_count,
            records = session.records_total(),
            "ingestion task ended"
        );

        let terminal = match outcome {
            Ok(()) => SessionStatus::Idle,
            Err(e) => SessionStatus::Failed { reason: e.to_string() },
        };
        status_tx.send_replace(terminal);
    }
}
