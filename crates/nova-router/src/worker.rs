use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::BoxFuture;
use nova_core::Fingerprint;
use nova_project::ProjectGraph;
use nova_remote_proto::{decode_message, encode_message, FindDeclarationsRequest, RpcMessage};
use nova_scheduler::{CancellationToken, Cancelled};

use crate::dispatch::{query_from_descriptor, RemoteHostClient};
use crate::engine::SearchEngine;
use crate::materialize::{dedup_within_projects, to_descriptor};
use crate::{SearchError, SearchOptions, SearchTarget};

type Snapshots = HashMap<Fingerprint, Arc<dyn ProjectGraph>>;

/// A search host that lives in the caller's process.
///
/// It speaks the same frames as an out-of-process host: requests are
/// decoded, executed on the worker's own [`SearchEngine`] against a
/// registered snapshot, and answered with descriptors. A request naming an
/// unregistered snapshot gets an `Error` reply.
pub struct InProcessWorker {
    engine: SearchEngine,
    snapshots: Mutex<Snapshots>,
    available: AtomicBool,
    served: AtomicU64,
}

impl InProcessWorker {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            snapshots: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            served: AtomicU64::new(0),
        }
    }

    /// Makes `graph` searchable; returns the checksum requests must name.
    pub fn register<G>(&self, graph: Arc<G>) -> Fingerprint
    where
        G: ProjectGraph + 'static,
    {
        let checksum = graph.checksum();
        let graph: Arc<dyn ProjectGraph> = graph;
        self.lock_snapshots().insert(checksum, graph);
        tracing::debug!(target = "nova.router", %checksum, "registered solution snapshot");
        checksum
    }

    pub fn unregister(&self, checksum: &Fingerprint) -> bool {
        self.lock_snapshots().remove(checksum).is_some()
    }

    /// While unavailable every invocation answers `Ok(None)`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of requests answered so far, including error replies.
    pub fn requests_served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    /// Handles one request frame and returns the reply frame.
    pub async fn handle_frame(
        &self,
        frame: &[u8],
        token: &CancellationToken,
    ) -> anyhow::Result<Vec<u8>> {
        let reply = match decode_message(frame) {
            Ok(RpcMessage::FindDeclarations(request)) => {
                self.find_declarations(request, token).await?
            }
            Ok(_) => RpcMessage::Error {
                message: "expected a FindDeclarations request".to_owned(),
            },
            Err(err) => RpcMessage::Error {
                message: format!("malformed request: {err}"),
            },
        };
        self.served.fetch_add(1, Ordering::SeqCst);
        Ok(encode_message(&reply)?)
    }

    async fn find_declarations(
        &self,
        request: FindDeclarationsRequest,
        token: &CancellationToken,
    ) -> Result<RpcMessage, Cancelled> {
        let Some(graph) = self.snapshot(&request.solution_checksum) else {
            return Ok(RpcMessage::Error {
                message: format!(
                    "unknown solution snapshot {}",
                    request.solution_checksum
                ),
            });
        };

        let query = query_from_descriptor(request.query);
        let options = SearchOptions {
            filter: request.filter,
            scope: request.scope,
        };
        let target = request
            .project
            .map_or(SearchTarget::Solution, SearchTarget::Project);

        match self
            .engine
            .search(graph.as_ref(), target, &query, &options, token)
            .await
        {
            Ok(symbols) => {
                let descriptors: Vec<_> = symbols.iter().map(to_descriptor).collect();
                Ok(RpcMessage::Declarations(dedup_within_projects(descriptors)))
            }
            Err(SearchError::Cancelled) => Err(Cancelled),
            Err(err) => Ok(RpcMessage::Error {
                message: err.to_string(),
            }),
        }
    }

    fn snapshot(&self, checksum: &Fingerprint) -> Option<Arc<dyn ProjectGraph>> {
        self.lock_snapshots().get(checksum).cloned()
    }

    #[track_caller]
    fn lock_snapshots(&self) -> MutexGuard<'_, Snapshots> {
        match self.snapshots.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target = "nova.router",
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

impl RemoteHostClient for InProcessWorker {
    fn try_invoke<'a>(
        &'a self,
        request: Vec<u8>,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<u8>>>> {
        Box::pin(async move {
            if !self.available.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.handle_frame(&request, token).await.map(Some)
        })
    }
}
