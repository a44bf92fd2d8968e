use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use nova_core::{Fingerprint, ProjectId};
use nova_project::Project;
use nova_scheduler::{CancellationToken, Cancelled};
use tokio::sync::OnceCell;

use crate::persistence::{load_persisted_index, persist_index, persisted_index_path};
use crate::{IndexError, SymbolTreeIndex};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    project: ProjectId,
    fingerprint: Fingerprint,
}

type Slot = Arc<OnceCell<Arc<SymbolTreeIndex>>>;

#[derive(Debug, Default)]
struct CacheInner {
    slots: HashMap<CacheKey, Slot>,
    order: VecDeque<CacheKey>,
}

impl CacheInner {
    fn touch(&mut self, key: CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }
}

/// Process-scoped cache of built symbol trees keyed by project and content
/// fingerprint.
///
/// Concurrent first requests for the same key share a single build. Entries
/// are evicted least-recently-used once `capacity` is exceeded; evicted
/// indexes stay alive for callers still holding them.
#[derive(Debug)]
pub struct SymbolTreeCache {
    capacity: usize,
    persist_dir: Option<PathBuf>,
    inner: Mutex<CacheInner>,
    builds: Arc<AtomicU64>,
    loads: Arc<AtomicU64>,
}

impl Default for SymbolTreeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SymbolTreeCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            persist_dir: None,
            inner: Mutex::new(CacheInner::default()),
            builds: Arc::new(AtomicU64::new(0)),
            loads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read persisted indexes from, and write new builds to, `dir`.
    pub fn with_persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist_dir = Some(dir.into());
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }

    /// Number of indexes built from source so far.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    /// Number of indexes read back from the persist directory so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock_inner().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        inner.slots.clear();
        inner.order.clear();
    }

    /// Returns the index for `project` if it is already built.
    pub fn get(&self, project: &Project) -> Option<Arc<SymbolTreeIndex>> {
        let key = CacheKey {
            project: project.id(),
            fingerprint: project.content_fingerprint(),
        };
        let mut inner = self.lock_inner();
        let index = inner.slots.get(&key)?.get()?.clone();
        inner.touch(key);
        Some(index)
    }

    /// Returns the index for `project`, building it on first use.
    ///
    /// Waiting stops as soon as `token` fires. If the caller that started a
    /// build is cancelled, the next waiter starts it again.
    pub async fn get_or_build(
        &self,
        project: &Project,
        token: &CancellationToken,
    ) -> Result<Arc<SymbolTreeIndex>, IndexError> {
        Cancelled::check(token)?;

        let key = CacheKey {
            project: project.id(),
            fingerprint: project.content_fingerprint(),
        };
        let slot = self.slot(key);

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(IndexError::Cancelled),
            result = slot.get_or_try_init(|| self.load_or_build(project.clone())) => {
                result.cloned()
            }
        }
    }

    fn slot(&self, key: CacheKey) -> Slot {
        let mut inner = self.lock_inner();
        if let Some(slot) = inner.slots.get(&key).cloned() {
            inner.touch(key);
            return slot;
        }

        let slot: Slot = Arc::new(OnceCell::new());
        inner.slots.insert(key, Arc::clone(&slot));
        inner.order.push_back(key);
        while inner.slots.len() > self.capacity {
            let Some(evicted) = inner.order.pop_front() else {
                break;
            };
            inner.slots.remove(&evicted);
            tracing::debug!(
                target = "nova.index",
                project = %evicted.project,
                fingerprint = %evicted.fingerprint,
                "evicted symbol tree"
            );
        }
        slot
    }

    async fn load_or_build(&self, project: Project) -> Result<Arc<SymbolTreeIndex>, IndexError> {
        // Cancelled when this initializer is dropped, so an abandoned build
        // stops at its next document boundary.
        let job_token = CancellationToken::new();
        let guard = job_token.clone().drop_guard();

        let persist_path = self
            .persist_dir
            .as_deref()
            .map(|dir| persisted_index_path(dir, project.id(), project.content_fingerprint()));
        let builds = Arc::clone(&self.builds);
        let loads = Arc::clone(&self.loads);

        let task = nova_scheduler::spawn_blocking(job_token, move |token| {
            build_job(&project, persist_path.as_deref(), token, &builds, &loads)
        });
        let result = task.join().await;
        guard.disarm();
        Ok(Arc::new(result?))
    }

    #[track_caller]
    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target = "nova.index",
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    error = %err,
                    "mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}

fn build_job(
    project: &Project,
    persist_path: Option<&Path>,
    token: &CancellationToken,
    builds: &AtomicU64,
    loads: &AtomicU64,
) -> Result<SymbolTreeIndex, Cancelled> {
    let fingerprint = project.content_fingerprint();

    if let Some(path) = persist_path {
        match load_persisted_index(path, fingerprint) {
            Ok(Some(index)) => {
                loads.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(
                    target = "nova.index",
                    project = %project.id(),
                    path = %path.display(),
                    "loaded persisted symbol tree"
                );
                return Ok(index);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    target = "nova.index",
                    project = %project.id(),
                    path = %path.display(),
                    error = %err,
                    "discarding unreadable persisted symbol tree"
                );
            }
        }
    }

    let index = SymbolTreeIndex::build_cancellable(project, token)?;
    builds.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(
        target = "nova.index",
        project = %project.id(),
        fingerprint = %fingerprint,
        nodes = index.node_count(),
        symbols = index.symbol_count(),
        "built symbol tree"
    );

    if let Some(path) = persist_path {
        if let Err(err) = persist_index(path, &index) {
            tracing::warn!(
                target = "nova.index",
                project = %project.id(),
                error = %err,
                "failed to persist symbol tree"
            );
        }
    }
    Ok(index)
}
