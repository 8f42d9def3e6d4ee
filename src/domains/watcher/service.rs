//! Filesystem watcher keeping the registry cache and source cache current.
//!
//! `notify` delivers events on its own thread; the callback only forwards
//! them over a channel. One tokio task owns the debouncer and applies every
//! action, so the caches are only ever touched from that task.

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use super::error::WatchError;
use super::events::{WatchAction, WatchTargets};
use super::source_cache::SourceCache;
use crate::domains::registry::RegistryCache;

/// Sleep target used while idle; the branch is disabled then anyway.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Counters describing what the watcher has done so far.
#[derive(Debug, Default)]
pub struct WatchStats {
    registry_reloads: AtomicU64,
    source_invalidations: AtomicU64,
    new_sources: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatsSnapshot {
    pub registry_reloads: u64,
    pub source_invalidations: u64,
    pub new_sources: u64,
}

impl WatchStats {
    pub fn registry_reloads(&self) -> u64 {
        self.registry_reloads.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> WatchStatsSnapshot {
        WatchStatsSnapshot {
            registry_reloads: self.registry_reloads(),
            source_invalidations: self.source_invalidations.load(Ordering::Relaxed),
            new_sources: self.new_sources.load(Ordering::Relaxed),
        }
    }
}

/// A running watcher. Dropping it stops both the OS watch and the event loop.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    stats: Arc<WatchStats>,
}

impl ChangeWatcher {
    /// Start watching the registry document and the tool-source directory.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        registry: Arc<RegistryCache>,
        sources: Arc<SourceCache>,
        tools_dir: &Path,
        delay: Duration,
    ) -> Result<Self, WatchError> {
        let registry_dir = match registry.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&registry_dir).map_err(|e| WatchError::io(&registry_dir, e))?;

        let targets = WatchTargets::new(registry.path(), tools_dir);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        debug!("Watcher event dropped: event loop has stopped");
                    }
                }
                Err(e) => warn!("Filesystem watch error: {}", e),
            }
        })?;

        // The parent directory is watched so rename-into-place writes are seen.
        watcher.watch(targets.registry_dir(), RecursiveMode::NonRecursive)?;
        info!("Watching registry {}", registry.path().display());

        if targets.tools_dir().is_dir() {
            watcher.watch(targets.tools_dir(), RecursiveMode::Recursive)?;
            info!("Watching tool sources in {}", targets.tools_dir().display());
        } else {
            warn!(
                "Tool source directory {} does not exist; source changes will not be tracked",
                targets.tools_dir().display()
            );
        }

        let stats = Arc::new(WatchStats::default());
        let task = tokio::spawn(run_event_loop(
            rx,
            targets,
            registry,
            sources,
            stats.clone(),
            delay,
        ));

        Ok(Self {
            _watcher: watcher,
            task,
            stats,
        })
    }

    pub fn stats(&self) -> &Arc<WatchStats> {
        &self.stats
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Apply watcher actions until the event channel closes.
pub(crate) async fn run_event_loop(
    mut rx: UnboundedReceiver<Event>,
    targets: WatchTargets,
    registry: Arc<RegistryCache>,
    sources: Arc<SourceCache>,
    stats: Arc<WatchStats>,
    delay: Duration,
) {
    let mut debouncer = Debouncer::new(delay);

    loop {
        let armed = debouncer.is_armed();
        let wake_at = debouncer
            .deadline()
            .unwrap_or_else(|| Instant::now() + IDLE_WAIT);

        tokio::select! {
            received = rx.recv() => {
                let Some(event) = received else {
                    debug!("Watcher channel closed, stopping event loop");
                    break;
                };
                for action in targets.classify(&event) {
                    apply(action, &mut debouncer, &sources, &stats);
                }
            }
            _ = tokio::time::sleep_until(wake_at), if armed => {
                if debouncer.fire(Instant::now()) {
                    stats.registry_reloads.fetch_add(1, Ordering::Relaxed);
                    info!("Registry changed on disk, reloading");
                    if registry.load(false).is_none() {
                        warn!("Registry reload failed; still serving the previous document");
                    }
                }
            }
        }
    }
}

fn apply(
    action: WatchAction,
    debouncer: &mut Debouncer,
    sources: &SourceCache,
    stats: &WatchStats,
) {
    match action {
        WatchAction::ReloadRegistry => {
            let rearm = debouncer.is_armed();
            debouncer.on_event(Instant::now());
            debug!(
                "Registry change observed, reload {} in {:?}",
                if rearm { "postponed" } else { "scheduled" },
                debouncer.delay()
            );
        }
        WatchAction::InvalidateSource(path) => {
            stats.source_invalidations.fetch_add(1, Ordering::Relaxed);
            sources.invalidate(&path);
        }
        WatchAction::NewSource(path) => {
            stats.new_sources.fetch_add(1, Ordering::Relaxed);
            warn!(
                "New tool source {} detected; run `generate-registry` to include it in the registry",
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, EventKind, ModifyKind};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedSender;

    struct Harness {
        _dir: TempDir,
        targets: WatchTargets,
        registry: Arc<RegistryCache>,
        sources: Arc<SourceCache>,
        stats: Arc<WatchStats>,
        tx: UnboundedSender<Event>,
        task: JoinHandle<()>,
    }

    fn start() -> Harness {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("tools")).unwrap();
        std::fs::create_dir(dir.path().join("tools/shadcn")).unwrap();
        std::fs::write(dir.path().join("tools/shadcn/README.md"), "docs").unwrap();

        let registry_path = dir.path().join("mcp-registry.json");
        let targets = WatchTargets::new(&registry_path, &dir.path().join("tools"));
        let registry = Arc::new(RegistryCache::new(&registry_path));
        let sources = Arc::new(SourceCache::new(dir.path().join("tools")));
        let stats = Arc::new(WatchStats::default());

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_event_loop(
            rx,
            targets.clone(),
            registry.clone(),
            sources.clone(),
            stats.clone(),
            Duration::from_millis(500),
        ));

        Harness {
            _dir: dir,
            targets,
            registry,
            sources,
            stats,
            tx,
            task,
        }
    }

    impl Harness {
        fn registry_event(&self) -> Event {
            Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
                .add_path(self.targets.registry_dir().join("mcp-registry.json"))
        }

        fn source_path(&self) -> PathBuf {
            self.targets.tools_dir().join("shadcn/README.md")
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_triggers_single_reload_after_last_event() {
        let h = start();

        h.tx.send(h.registry_event()).unwrap();
        settle().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        h.tx.send(h.registry_event()).unwrap();
        settle().await;

        // 500ms after the first event, but only 400ms after the second.
        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert_eq!(h.stats.registry_reloads(), 0);

        tokio::time::advance(Duration::from_millis(101)).await;
        settle().await;
        assert_eq!(h.stats.registry_reloads(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(h.stats.registry_reloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_picks_up_new_document() {
        let h = start();
        crate::domains::registry::RegistryDocument::new(Vec::new())
            .write_to(h.registry.path())
            .unwrap();
        assert!(h.registry.current().is_none());

        h.tx.send(h.registry_event()).unwrap();
        settle().await;
        tokio::time::advance(Duration::from_millis(501)).await;
        settle().await;

        assert!(h.registry.current().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_change_invalidates_immediately() {
        let h = start();
        h.sources.read("shadcn/README.md").unwrap();
        assert_eq!(h.sources.len(), 1);

        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(h.source_path());
        h.tx.send(event).unwrap();
        settle().await;

        assert!(h.sources.is_empty());
        assert_eq!(h.stats.snapshot().source_invalidations, 1);
        assert_eq!(h.stats.registry_reloads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_source_only_counts() {
        let h = start();
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(h.targets.tools_dir().join("stripe/README.md"));
        h.tx.send(event).unwrap();
        settle().await;

        let snapshot = h.stats.snapshot();
        assert_eq!(snapshot.new_sources, 1);
        assert_eq!(snapshot.registry_reloads, 0);
    }

    #[tokio::test]
    async fn test_spawned_watcher_reloads_after_atomic_write() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("tools")).unwrap();
        let registry = Arc::new(RegistryCache::new(dir.path().join("registry/mcp-registry.json")));
        let sources = Arc::new(SourceCache::new(dir.path().join("tools")));

        let watcher = ChangeWatcher::spawn(
            registry.clone(),
            sources,
            &dir.path().join("tools"),
            Duration::from_millis(100),
        )
        .unwrap();
        assert!(registry.current().is_none());

        crate::domains::registry::RegistryDocument::new(Vec::new())
            .write_to(registry.path())
            .unwrap();

        for _ in 0..100 {
            if registry.current().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(registry.current().is_some());

        // The temp file and rename events of one write coalesce into one reload.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(watcher.stats().registry_reloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_when_channel_closes() {
        let h = start();
        drop(h.tx);
        settle().await;
        assert!(h.task.is_finished());
    }
}
