//! Snapshot store, scan coordination and periodic refresh.
//!
//! A single store task owns the current [`Snapshot`], the filter settings and
//! the last kill report. Everything else talks to it through an
//! [`OrchestratorHandle`]: commands go in over a channel, immutable
//! [`StoreView`]s come out over a watch channel. Scans and grace periods run
//! in their own tasks and hand their results back as messages, so only the
//! store task ever writes state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::adapters::{PortScanner, UnixSignaller};
use crate::config::EngineConfig;
use crate::domain::{
    histogram, Category, EntryFilter, KillReport, ListeningEntry, Snapshot,
};
use crate::error::{Error, Result};
use crate::ports::{ListingSource, Signaller};

use super::terminator::ProcessTerminator;

/// User intents accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a scan now. Overlapping scans are allowed; the last to finish wins.
    RequestScan,
    /// Terminate the process owning an entry, then rescan.
    RequestKill(ListeningEntry),
    /// Replace the search text.
    SetSearch(String),
    /// Replace the category filter.
    SetCategory(Option<Category>),
}

/// Results handed back to the store by background tasks.
enum Completion {
    ScanFinished(Snapshot),
    KillResolved(KillReport),
}

/// Immutable copy of the store state, as published to readers.
#[derive(Debug, Clone)]
pub struct StoreView {
    /// Latest completed snapshot (unfiltered).
    pub snapshot: Arc<Snapshot>,
    /// Active filter settings.
    pub filter: EntryFilter,
    /// Snapshot entries after filtering, sorted by port.
    pub entries: Vec<ListeningEntry>,
    /// Category counts over the unfiltered snapshot.
    pub histogram: Vec<(Category, usize)>,
    /// True while at least one scan is in flight. Best effort.
    pub scanning: bool,
    /// Number of scans completed since the store started.
    pub completed_scans: u64,
    /// Kill requests still inside their grace period.
    pub pending_kills: usize,
    /// Outcome of the most recently resolved kill request.
    pub last_kill: Option<KillReport>,
}

/// Spawns and owns the store task.
pub struct ScanOrchestrator<S, G> {
    source: Arc<S>,
    terminator: ProcessTerminator<G>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    view: watch::Sender<StoreView>,

    snapshot: Arc<Snapshot>,
    filter: EntryFilter,
    scans_in_flight: usize,
    completed_scans: u64,
    pending_kills: usize,
    last_kill: Option<KillReport>,
}

impl ScanOrchestrator<PortScanner, UnixSignaller> {
    /// Spawn a store using lsof and POSIX signals.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &EngineConfig) -> OrchestratorHandle {
        let source = PortScanner::with_config(config.scanner.clone());
        let terminator = ProcessTerminator::with_grace_period(UnixSignaller::new(), config.grace_period);
        Self::spawn(source, terminator)
    }
}

impl<S, G> ScanOrchestrator<S, G>
where
    S: ListingSource + 'static,
    G: Signaller + 'static,
{
    /// Spawn the store task and return a handle to it.
    ///
    /// The task stops once every handle (and every [`Scheduler`]) is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: S, terminator: ProcessTerminator<G>) -> OrchestratorHandle {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();

        let snapshot = Arc::new(Snapshot::empty());
        let filter = EntryFilter::default();
        let (view, view_rx) = watch::channel(StoreView {
            snapshot: Arc::clone(&snapshot),
            filter: filter.clone(),
            entries: Vec::new(),
            histogram: Vec::new(),
            scanning: false,
            completed_scans: 0,
            pending_kills: 0,
            last_kill: None,
        });

        let store = Self {
            source: Arc::new(source),
            terminator,
            commands,
            completions_tx,
            completions,
            view,
            snapshot,
            filter,
            scans_in_flight: 0,
            completed_scans: 0,
            pending_kills: 0,
            last_kill: None,
        };
        tokio::spawn(store.run());

        OrchestratorHandle {
            commands: commands_tx,
            view: view_rx,
        }
    }

    async fn run(mut self) {
        debug!("Store task started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
            }
        }
        debug!("Store task stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::RequestScan => self.start_scan(),
            Command::RequestKill(entry) => self.start_kill(&entry),
            Command::SetSearch(text) => {
                self.filter.search_text = text;
                self.publish();
            }
            Command::SetCategory(category) => {
                self.filter.category = category;
                self.publish();
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::ScanFinished(snapshot) => {
                self.scans_in_flight = self.scans_in_flight.saturating_sub(1);
                self.completed_scans += 1;
                debug!(
                    entries = snapshot.len(),
                    in_flight = self.scans_in_flight,
                    "Snapshot replaced"
                );
                self.snapshot = Arc::new(snapshot);
                self.publish();
            }
            Completion::KillResolved(report) => {
                self.pending_kills = self.pending_kills.saturating_sub(1);
                info!(report = %report, "Kill finished, refreshing");
                self.last_kill = Some(report);
                self.publish();
                self.start_scan();
            }
        }
    }

    fn start_scan(&mut self) {
        self.scans_in_flight += 1;
        self.publish();

        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let snapshot = match source.try_scan().await {
                Ok(entries) => Snapshot::new(entries),
                Err(e) => {
                    warn!(error = %e, "Port scan failed");
                    Snapshot::failed(e.to_string())
                }
            };
            let _ = completions.send(Completion::ScanFinished(snapshot));
        });
    }

    fn start_kill(&mut self, entry: &ListeningEntry) {
        // SIGTERM goes out here, on the store task; only the wait is spawned
        let mut request = self.terminator.request(entry.pid, Some(entry.port));
        request.send_graceful();

        self.pending_kills += 1;
        self.publish();

        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let report = request.resolve().await;
            let _ = completions.send(Completion::KillResolved(report));
        });
    }

    fn publish(&self) {
        self.view.send_replace(StoreView {
            snapshot: Arc::clone(&self.snapshot),
            filter: self.filter.clone(),
            entries: self.filter.apply(self.snapshot.entries()),
            histogram: histogram(self.snapshot.entries()),
            scanning: self.scans_in_flight > 0,
            completed_scans: self.completed_scans,
            pending_kills: self.pending_kills,
            last_kill: self.last_kill.clone(),
        });
    }
}

/// Cloneable front end of the store task.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<StoreView>,
}

impl OrchestratorHandle {
    /// Submit a command to the store.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Shutdown)
    }

    pub fn request_scan(&self) -> Result<()> {
        self.send(Command::RequestScan)
    }

    pub fn request_kill(&self, entry: ListeningEntry) -> Result<()> {
        self.send(Command::RequestKill(entry))
    }

    pub fn set_search(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SetSearch(text.into()))
    }

    pub fn set_category(&self, category: Option<Category>) -> Result<()> {
        self.send(Command::SetCategory(category))
    }

    /// Latest published view.
    pub fn view(&self) -> StoreView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified on every published view.
    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.view.clone()
    }

    /// Wait until a published view satisfies `predicate`, and return it.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&StoreView) -> bool) -> Result<StoreView> {
        let mut rx = self.view.clone();
        let view = rx.wait_for(|view| predicate(view)).await.map_err(|_| Error::Shutdown)?;
        Ok(view.clone())
    }
}

/// Periodic scan trigger.
///
/// Holds the ticking task's handle; stopping aborts only that task, so scans
/// it already requested still complete.
pub struct Scheduler {
    handle: OrchestratorHandle,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(handle: OrchestratorHandle, period: Duration) -> Self {
        Self {
            handle,
            period,
            task: Mutex::new(None),
        }
    }

    /// Start ticking. The first scan is requested immediately.
    ///
    /// Returns false if the scheduler was already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }

        let handle = self.handle.clone();
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if handle.request_scan().is_err() {
                    break;
                }
            }
        }));
        debug!(period_ms = self.period.as_millis() as u64, "Scheduler started");
        true
    }

    /// Cancel future ticks. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some(task) => {
                task.abort();
                debug!("Scheduler stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::sleep;

    use super::*;
    use crate::domain::TerminationOutcome;
    use crate::error::SignalError;
    use crate::ports::Signal;

    type Response = (Duration, Result<Vec<ListeningEntry>>);

    /// Plays back queued responses, then repeats `fallback`.
    struct MockSource {
        responses: Mutex<VecDeque<Response>>,
        fallback: Vec<ListeningEntry>,
        calls: Arc<AtomicUsize>,
    }

    impl MockSource {
        fn new(fallback: Vec<ListeningEntry>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                fallback,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn then(self, delay: Duration, result: Result<Vec<ListeningEntry>>) -> Self {
            self.responses.lock().push_back((delay, result));
            self
        }
    }

    impl ListingSource for MockSource {
        async fn try_scan(&self) -> Result<Vec<ListeningEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().pop_front();
            let (delay, result) = next.unwrap_or((Duration::ZERO, Ok(self.fallback.clone())));
            sleep(delay).await;
            result
        }
    }

    /// Every process exits on SIGTERM.
    struct ObedientSignaller {
        sent: Arc<Mutex<Vec<(i32, Signal)>>>,
    }

    impl Signaller for ObedientSignaller {
        fn send(&self, pid: i32, signal: Signal) -> std::result::Result<(), SignalError> {
            self.sent.lock().push((pid, signal));
            Ok(())
        }

        fn is_alive(&self, _pid: i32) -> bool {
            false
        }
    }

    fn entry(port: u16, pid: i32, name: &str) -> ListeningEntry {
        ListeningEntry::new(port, pid, name, "user", "*")
    }

    fn sample() -> Vec<ListeningEntry> {
        vec![entry(8080, 10, "java"), entry(22, 1, "sshd"), entry(5432, 20, "postgres")]
    }

    fn spawn(source: MockSource) -> (OrchestratorHandle, Arc<Mutex<Vec<(i32, Signal)>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let signaller = ObedientSignaller { sent: Arc::clone(&sent) };
        let handle = ScanOrchestrator::spawn(source, ProcessTerminator::new(signaller));
        (handle, sent)
    }

    fn ports(view: &StoreView) -> Vec<u16> {
        view.entries.iter().map(|e| e.port).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_publishes_sorted_view() {
        let (handle, _) = spawn(MockSource::new(sample()));
        assert!(handle.view().snapshot.is_empty());

        handle.request_scan().unwrap();
        let view = handle.wait_for(|v| v.completed_scans == 1).await.unwrap();

        assert_eq!(ports(&view), vec![22, 5432, 8080]);
        assert!(!view.scanning);
        assert_eq!(
            view.histogram,
            vec![(Category::WebDev, 1), (Category::Database, 1), (Category::System, 1)]
        );
        assert!(view.snapshot.failure().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_apply_to_current_snapshot() {
        let (handle, _) = spawn(MockSource::new(sample()));
        handle.request_scan().unwrap();
        handle.wait_for(|v| v.completed_scans == 1).await.unwrap();

        handle.set_category(Some(Category::Database)).unwrap();
        handle.set_search("54").unwrap();
        let view = handle
            .wait_for(|v| v.filter.search_text == "54")
            .await
            .unwrap();

        assert_eq!(ports(&view), vec![5432]);
        // Histogram ignores the filter
        assert_eq!(view.histogram.len(), 3);

        handle.set_category(None).unwrap();
        handle.set_search("").unwrap();
        let view = handle.wait_for(|v| !v.filter.is_active()).await.unwrap();
        assert_eq!(view.entries.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanning_flag() {
        let source = MockSource::new(sample()).then(Duration::from_secs(1), Ok(sample()));
        let (handle, _) = spawn(source);

        handle.request_scan().unwrap();
        handle.wait_for(|v| v.scanning).await.unwrap();
        let view = handle.wait_for(|v| !v.scanning).await.unwrap();
        assert_eq!(view.completed_scans, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_completed_scan_wins() {
        let slow = vec![entry(3000, 1, "slow")];
        let fast = vec![entry(4000, 2, "fast")];
        let source = MockSource::new(Vec::new())
            .then(Duration::from_secs(2), Ok(slow))
            .then(Duration::from_secs(1), Ok(fast));
        let (handle, _) = spawn(source);

        handle.request_scan().unwrap();
        handle.request_scan().unwrap();

        let view = handle.wait_for(|v| v.completed_scans == 1).await.unwrap();
        assert_eq!(ports(&view), vec![4000]);
        assert!(view.scanning);

        let view = handle.wait_for(|v| v.completed_scans == 2).await.unwrap();
        assert_eq!(ports(&view), vec![3000]);
        assert!(!view.scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_scan_is_distinguishable() {
        let source = MockSource::new(Vec::new()).then(
            Duration::ZERO,
            Err(Error::CommandFailed("Failed to run lsof: not found".to_string())),
        );
        let (handle, _) = spawn(source);

        handle.request_scan().unwrap();
        let view = handle.wait_for(|v| v.completed_scans == 1).await.unwrap();
        assert!(view.entries.is_empty());
        assert!(view.snapshot.failure().unwrap().contains("lsof"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_resolves_then_rescans() {
        let target = entry(3000, 77, "node");
        let source = MockSource::new(Vec::new()).then(Duration::ZERO, Ok(vec![target.clone()]));
        let (handle, sent) = spawn(source);

        handle.request_scan().unwrap();
        handle.wait_for(|v| v.completed_scans == 1).await.unwrap();

        handle.request_kill(target).unwrap();
        let view = handle.wait_for(|v| v.pending_kills == 1).await.unwrap();
        assert!(view.last_kill.is_none());

        let view = handle
            .wait_for(|v| v.last_kill.is_some() && v.completed_scans == 2)
            .await
            .unwrap();
        let report = view.last_kill.unwrap();
        assert_eq!(report.pid, 77);
        assert_eq!(report.port, Some(3000));
        assert_eq!(report.outcome, TerminationOutcome::Success);
        assert_eq!(view.pending_kills, 0);
        assert!(view.entries.is_empty());
        assert_eq!(*sent.lock(), vec![(77, Signal::Terminate)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_start_stop() {
        let source = MockSource::new(sample());
        let calls = Arc::clone(&source.calls);
        let (handle, _) = spawn(source);
        let scheduler = Scheduler::new(handle.clone(), Duration::from_secs(5));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());

        // Ticks at 0s, 5s and 10s
        sleep(Duration::from_secs(12)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Restartable
        assert!(scheduler.start());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_in_flight_scan() {
        let source = MockSource::new(sample()).then(Duration::from_secs(3), Ok(sample()));
        let (handle, _) = spawn(source);
        let scheduler = Scheduler::new(handle.clone(), Duration::from_secs(5));

        scheduler.start();
        handle.wait_for(|v| v.scanning).await.unwrap();
        scheduler.stop();

        let view = handle.wait_for(|v| v.completed_scans == 1).await.unwrap();
        assert_eq!(view.entries.len(), 3);
    }

    #[tokio::test]
    async fn test_handle_reports_shutdown() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let (_view_tx, view) = watch::channel(StoreView {
            snapshot: Arc::new(Snapshot::empty()),
            filter: EntryFilter::default(),
            entries: Vec::new(),
            histogram: Vec::new(),
            scanning: false,
            completed_scans: 0,
            pending_kills: 0,
            last_kill: None,
        });
        let handle = OrchestratorHandle { commands: tx, view };
        assert!(matches!(handle.request_scan(), Err(Error::Shutdown)));
    }
}
