//! Chooses where a query runs.
//!
//! A query goes to the remote host first when a host is attached and the
//! query can be shipped. Anything short of a usable remote answer falls back
//! to exactly one local execution. Cancellation is never treated as a remote
//! failure.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use futures::future::BoxFuture;
use nova_index::{SearchQuery, Symbol};
use nova_project::ProjectGraph;
use nova_remote_proto::{
    decode_message, encode_message, FindDeclarationsRequest, QueryDescriptor, RpcMessage,
};
use nova_scheduler::{CancellationToken, Cancelled};

use crate::engine::{is_trivially_empty, SearchEngine};
use crate::materialize::{dedup_within_projects, resolve_all};
use crate::{SearchError, SearchOptions, SearchTarget};

/// Byte-level channel to an out-of-process search host.
///
/// `Ok(None)` means the host is not reachable right now; `Err` means it was
/// reached and failed. Requests and replies are frames produced by
/// [`nova_remote_proto::encode_message`].
pub trait RemoteHostClient: Send + Sync {
    fn try_invoke<'a>(
        &'a self,
        request: Vec<u8>,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<u8>>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    NotAttempted,
    RemoteAttempted,
    RemoteSucceeded,
    RemoteUnavailable,
    RemoteFailed,
    LocalFallback,
    Completed,
}

/// The states one dispatch went through, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTrace {
    states: Vec<DispatchState>,
}

impl DispatchTrace {
    fn new() -> Self {
        Self {
            states: vec![DispatchState::NotAttempted],
        }
    }

    fn record(&mut self, state: DispatchState) {
        tracing::trace!(target = "nova.router", ?state, "dispatch transition");
        self.states.push(state);
    }

    pub fn states(&self) -> &[DispatchState] {
        &self.states
    }

    pub fn contains(&self, state: DispatchState) -> bool {
        self.states.contains(&state)
    }

    pub fn remote_succeeded(&self) -> bool {
        self.contains(DispatchState::RemoteSucceeded)
    }

    pub fn ran_locally(&self) -> bool {
        self.contains(DispatchState::LocalFallback)
    }
}

impl fmt::Display for DispatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{state:?}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub symbols: Vec<Symbol>,
    pub trace: DispatchTrace,
}

enum RemoteOutcome {
    Succeeded(Vec<Symbol>),
    Unavailable,
    Failed(anyhow::Error),
}

/// Converts `query` into its wire form; `None` for predicates.
pub fn query_descriptor(query: &SearchQuery) -> Option<QueryDescriptor> {
    match query {
        SearchQuery::Exact(name) => Some(QueryDescriptor::Exact(name.clone())),
        SearchQuery::ExactIgnoreCase(name) => Some(QueryDescriptor::ExactIgnoreCase(name.clone())),
        SearchQuery::Fuzzy(pattern) => Some(QueryDescriptor::Fuzzy(pattern.clone())),
        SearchQuery::Predicate(_) => None,
    }
}

pub fn query_from_descriptor(descriptor: QueryDescriptor) -> SearchQuery {
    match descriptor {
        QueryDescriptor::Exact(name) => SearchQuery::Exact(name),
        QueryDescriptor::ExactIgnoreCase(name) => SearchQuery::ExactIgnoreCase(name),
        QueryDescriptor::Fuzzy(pattern) => SearchQuery::Fuzzy(pattern),
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    engine: SearchEngine,
    remote: Option<Arc<dyn RemoteHostClient>>,
    remote_enabled: bool,
}

impl Dispatcher {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            remote: None,
            remote_enabled: true,
        }
    }

    pub fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_remote(mut self, client: Arc<dyn RemoteHostClient>) -> Self {
        self.remote = Some(client);
        self
    }

    pub fn with_remote_enabled(mut self, enabled: bool) -> Self {
        self.remote_enabled = enabled;
        self
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    fn active_remote(&self) -> Option<&dyn RemoteHostClient> {
        if self.remote_enabled {
            self.remote.as_deref()
        } else {
            None
        }
    }

    pub async fn dispatch(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<DispatchOutcome, SearchError> {
        Cancelled::check(token)?;
        if let SearchTarget::Project(id) = target {
            if graph.project(id).is_none() {
                return Err(SearchError::UnknownProject(id));
            }
        }

        let mut trace = DispatchTrace::new();
        if is_trivially_empty(query, options) {
            trace.record(DispatchState::Completed);
            return Ok(DispatchOutcome {
                symbols: Vec::new(),
                trace,
            });
        }

        if query.is_remote_eligible() {
            match self.active_remote() {
                Some(remote) => {
                    trace.record(DispatchState::RemoteAttempted);
                    match self
                        .try_remote(remote, graph, target, query, options, token)
                        .await?
                    {
                        RemoteOutcome::Succeeded(symbols) => {
                            trace.record(DispatchState::RemoteSucceeded);
                            trace.record(DispatchState::Completed);
                            tracing::debug!(
                                target = "nova.router",
                                matches = symbols.len(),
                                "declaration search answered remotely"
                            );
                            return Ok(DispatchOutcome { symbols, trace });
                        }
                        RemoteOutcome::Unavailable => {
                            tracing::debug!(
                                target = "nova.router",
                                "remote host unavailable; searching locally"
                            );
                            trace.record(DispatchState::RemoteUnavailable);
                        }
                        RemoteOutcome::Failed(err) => {
                            tracing::warn!(
                                target = "nova.router",
                                error = %format!("{err:#}"),
                                "remote declaration search failed; searching locally"
                            );
                            trace.record(DispatchState::RemoteFailed);
                        }
                    }
                }
                None => trace.record(DispatchState::RemoteUnavailable),
            }
        }

        trace.record(DispatchState::LocalFallback);
        let symbols = self
            .engine
            .search(graph, target, query, options, token)
            .await?;
        let symbols = dedup_within_projects(symbols);
        trace.record(DispatchState::Completed);
        Ok(DispatchOutcome { symbols, trace })
    }

    async fn try_remote(
        &self,
        remote: &dyn RemoteHostClient,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<RemoteOutcome, SearchError> {
        let Some(descriptor) = query_descriptor(query) else {
            return Ok(RemoteOutcome::Unavailable);
        };
        let request = RpcMessage::FindDeclarations(FindDeclarationsRequest {
            solution_checksum: graph.checksum(),
            project: target.project(),
            query: descriptor,
            filter: options.filter,
            scope: options.scope,
        });
        let frame = match encode_message(&request).context("encode declaration request") {
            Ok(frame) => frame,
            Err(err) => return Ok(RemoteOutcome::Failed(err)),
        };

        let reply = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(SearchError::Cancelled),
            reply = remote.try_invoke(frame, token) => reply,
        };
        Cancelled::check(token)?;

        let reply = match reply {
            Ok(Some(reply)) => reply,
            Ok(None) => return Ok(RemoteOutcome::Unavailable),
            Err(err) => return Ok(RemoteOutcome::Failed(err)),
        };
        let descriptors = match decode_message(&reply).context("decode declaration reply") {
            Ok(RpcMessage::Declarations(descriptors)) => descriptors,
            Ok(RpcMessage::Error { message }) => {
                return Ok(RemoteOutcome::Failed(anyhow!("remote host error: {message}")))
            }
            Ok(RpcMessage::FindDeclarations(_)) => {
                return Ok(RemoteOutcome::Failed(anyhow!(
                    "remote host answered with a request"
                )))
            }
            Err(err) => return Ok(RemoteOutcome::Failed(err)),
        };

        let descriptors = match target.project() {
            Some(project) => descriptors
                .into_iter()
                .filter(|descriptor| descriptor.project == project)
                .collect(),
            None => descriptors,
        };
        let symbols = resolve_all(descriptors, graph, self.engine.cache(), token).await?;
        Ok(RemoteOutcome::Succeeded(symbols))
    }
}
