//! Polling service surface over the pipeline.
//!
//! Front ends (web routes, TUIs) observe the pipeline by polling read-only
//! snapshots and fire actions that return immediately: scan and connect run
//! on background tasks and report back through shared state, never through
//! a blocking return value. Nothing here waits on the ingestion path.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::broadcast::{RecordBroadcaster, RecordSink};
use crate::config::PipelineConfig;
use crate::driver::Driver;
use crate::interval::IntervalSnapshot;
use crate::session::{ConnectionSession, SessionStatus};
use crate::sinks::{CsvLogSink, RollingWindowStore, SharedWindow, WindowSink, WindowSummary};
use crate::transport::Transport;
use crate::types::{DeviceInfo, SensorRecord};
use crate::{Result, TelemetryError};

/// How a connect request picks its device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// Connect to an explicit transport address.
    Address(String),
    /// Scan and connect to the first device whose advertised name contains
    /// the configured device name.
    Auto,
}

struct ActiveSession {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Pipeline orchestrator and snapshot surface.
///
/// Owns the transport, the rolling window (which outlives individual
/// sessions), and the shared state polled by callers. At most one session
/// is active at a time; a connect while active is rejected, never queued.
///
/// ```rust,no_run
/// use lumitel::{ConnectTarget, PipelineConfig, TelemetryService, transports::ReplayTransport};
///
/// # #[tokio::main]
/// # async fn main() -> lumitel::Result<()> {
/// let transport = ReplayTransport::open("capture.bin")?;
/// let service = TelemetryService::new(transport, PipelineConfig::default());
///
/// service.start_scan()?;
/// // ...poll service.devices(), then:
/// service.connect(ConnectTarget::Auto)?;
/// # Ok(())
/// # }
/// ```
pub struct TelemetryService<T: Transport> {
    transport: Arc<T>,
    config: PipelineConfig,
    window: SharedWindow,
    devices: Arc<Mutex<Vec<DeviceInfo>>>,
    interval: Arc<Mutex<IntervalSnapshot>>,
    status_tx: watch::Sender<SessionStatus>,
    latest_tx: watch::Sender<Option<Arc<SensorRecord>>>,
    log_path: Arc<Mutex<Option<PathBuf>>>,
    active: Mutex<Option<ActiveSession>>,
}

impl<T: Transport> TelemetryService<T> {
    /// Create a service around a transport.
    pub fn new(transport: T, config: PipelineConfig) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let (latest_tx, _) = watch::channel(None);

        TelemetryService {
            transport: Arc::new(transport),
            window: RollingWindowStore::shared(config.window_capacity),
            devices: Arc::new(Mutex::new(Vec::new())),
            interval: Arc::new(Mutex::new(IntervalSnapshot::default())),
            status_tx,
            latest_tx,
            log_path: Arc::new(Mutex::new(None)),
            active: Mutex::new(None),
            config,
        }
    }

    /// Start a background discovery pass.
    ///
    /// Results land in [`devices`](Self::devices); completion is observable
    /// through [`status`](Self::status). The returned handle is only needed
    /// by callers that want to await completion directly.
    ///
    /// # Errors
    ///
    /// Rejected with [`TelemetryError::SessionActive`] while a session owns
    /// the transport.
    pub fn start_scan(&self) -> Result<JoinHandle<()>> {
        if self.status().is_busy() {
            return Err(TelemetryError::SessionActive);
        }

        let transport = Arc::clone(&self.transport);
        let devices = Arc::clone(&self.devices);
        let status_tx = self.status_tx.clone();
        status_tx.send_replace(SessionStatus::Scanning);

        Ok(tokio::spawn(async move {
            match transport.discover().await {
                Ok(found) => {
                    info!(count = found.len(), "scan complete");
                    *devices.lock().unwrap_or_else(PoisonError::into_inner) = found;
                    // A connect may have started mid-scan; only fall back to
                    // Idle if the status is still ours.
                    status_tx.send_if_modified(|status| {
                        if *status == SessionStatus::Scanning {
                            *status = SessionStatus::Idle;
                            true
                        } else {
                            false
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "scan failed");
                    status_tx.send_if_modified(|status| {
                        if *status == SessionStatus::Scanning {
                            *status = SessionStatus::Failed { reason: e.to_string() };
                            true
                        } else {
                            false
                        }
                    });
                }
            }
        }))
    }

    /// Start a session on a background task.
    ///
    /// Progress is observable through [`status`](Self::status): Connecting,
    /// then Active, then Idle or Failed once the session ends.
    ///
    /// # Errors
    ///
    /// Rejected with [`TelemetryError::SessionActive`] if a session is
    /// already running.
    pub fn connect(&self, target: ConnectTarget) -> Result<()> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = active.as_ref() {
            if !session.handle.is_finished() {
                warn!("connect rejected, session already active");
                return Err(TelemetryError::SessionActive);
            }
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session(
            Arc::clone(&self.transport),
            self.config.clone(),
            target,
            Arc::clone(&self.window),
            Arc::clone(&self.interval),
            self.status_tx.clone(),
            self.latest_tx.clone(),
            Arc::clone(&self.log_path),
            cancel.clone(),
        ));

        *active = Some(ActiveSession { cancel, handle });
        Ok(())
    }

    /// Request a cooperative disconnect of the active session, if any.
    ///
    /// Returns immediately; the session observes the signal at its next
    /// suspension point and tears down (sink finalization included) on its
    /// own task.
    pub fn disconnect(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = active.as_ref() {
            if !session.handle.is_finished() {
                info!("disconnect requested");
                session.cancel.cancel();
            }
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    /// Stream of status changes, starting with the current status.
    pub fn status_updates(&self) -> impl Stream<Item = SessionStatus> + 'static {
        WatchStream::new(self.status_tx.subscribe())
    }

    /// Devices found by the most recent completed scan.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Copy of the rolling window contents, oldest first.
    pub fn window_snapshot(&self) -> Vec<SensorRecord> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    /// Summary statistics over the rolling window.
    pub fn window_summary(&self) -> WindowSummary {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).summary()
    }

    /// Drop all rolling-window contents. The window survives sessions, so
    /// this is the only way to empty it.
    pub fn clear_window(&self) {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Read and clear the "new data since last check" flag.
    pub fn take_new_data(&self) -> bool {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).take_new_data()
    }

    /// Inferred interval and recent zone changes of the current session.
    pub fn interval_info(&self) -> IntervalSnapshot {
        self.interval.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Most recently broadcast record of the current session, if any.
    pub fn latest_record(&self) -> Option<Arc<SensorRecord>> {
        self.latest_tx.borrow().clone()
    }

    /// Stream of broadcast records, latest-wins.
    ///
    /// A slow consumer of this stream only ever skips to the newest record;
    /// it can never apply backpressure to the ingestion path.
    pub fn record_updates(&self) -> impl Stream<Item = Arc<SensorRecord>> + 'static {
        WatchStream::new(self.latest_tx.subscribe()).filter_map(|opt| async move { opt })
    }

    /// Path of the most recent session's CSV log, if one was opened.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_path.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Latest-record sink feeding the watch channel behind
/// [`TelemetryService::latest_record`].
struct LatestRecordSink {
    tx: watch::Sender<Option<Arc<SensorRecord>>>,
}

impl RecordSink for LatestRecordSink {
    fn name(&self) -> &str {
        "latest-record"
    }

    fn on_record(&mut self, record: &SensorRecord) -> Result<()> {
        self.tx.send_replace(Some(Arc::new(*record)));
        Ok(())
    }
}

/// One complete session lifecycle: resolve the target, connect, stream,
/// tear down. Runs on its own task; every outcome is reported through the
/// status channel.
#[allow(clippy::too_many_arguments)]
async fn run_session<T: Transport>(
    transport: Arc<T>,
    config: PipelineConfig,
    target: ConnectTarget,
    window: SharedWindow,
    interval: Arc<Mutex<IntervalSnapshot>>,
    status_tx: watch::Sender<SessionStatus>,
    latest_tx: watch::Sender<Option<Arc<SensorRecord>>>,
    log_path: Arc<Mutex<Option<PathBuf>>>,
    cancel: CancellationToken,
) {
    let address = match target {
        ConnectTarget::Address(address) => address,
        ConnectTarget::Auto => {
            status_tx
                .send_replace(SessionStatus::Connecting { target: config.device_name.clone() });
            match transport.discover().await {
                Ok(found) => {
                    match found.into_iter().find(|d| d.name.contains(&config.device_name)) {
                        Some(device) => {
                            info!(device = %device, "auto-connect target resolved");
                            device.address
                        }
                        None => {
                            warn!(name = %config.device_name, "auto-connect target not found");
                            status_tx.send_replace(SessionStatus::Failed {
                                reason: format!("no device named '{}' found", config.device_name),
                            });
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "auto-connect discovery failed");
                    status_tx.send_replace(SessionStatus::Failed { reason: e.to_string() });
                    return;
                }
            }
        }
    };

    status_tx.send_replace(SessionStatus::Connecting { target: address.clone() });
    let link = match transport.connect(&address).await {
        Ok(link) => link,
        Err(e) => {
            warn!(%address, error = %e, "connect failed");
            status_tx.send_replace(SessionStatus::Failed { reason: e.to_string() });
            return;
        }
    };

    // Fresh session state: nothing from a prior session survives here.
    latest_tx.send_replace(None);
    *interval.lock().unwrap_or_else(PoisonError::into_inner) = IntervalSnapshot::default();

    let mut broadcaster = RecordBroadcaster::new();
    match CsvLogSink::create(&config.log_dir) {
        Ok(sink) => {
            *log_path.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(sink.path().to_path_buf());
            broadcaster.register(Box::new(sink));
        }
        Err(e) => {
            *log_path.lock().unwrap_or_else(PoisonError::into_inner) = None;
            warn!(error = %e, "session log unavailable, continuing without it");
        }
    }
    broadcaster.register(Box::new(WindowSink::new(window)));
    broadcaster.register(Box::new(LatestRecordSink { tx: latest_tx }));

    let session = ConnectionSession::new(&config, broadcaster);
    info!(%address, "session active");
    status_tx.send_replace(SessionStatus::Active { address });

    Driver::run(link, session, status_tx, interval, cancel).await;
}
