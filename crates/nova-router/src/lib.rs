//! Declaration search over a multi-project solution.
//!
//! [`SymbolFinder`] is the entry point. Each query goes through the
//! [`Dispatcher`], which tries an attached [`RemoteHostClient`] first and
//! falls back to the in-process [`SearchEngine`]. Remote answers arrive as
//! descriptors and are resolved against the caller's own snapshot, so both
//! paths return the same live [`Symbol`]s.

use std::sync::Arc;

use nova_config::SearchConfig;
use nova_core::{ProjectId, SearchScope, SymbolFilter};
use nova_index::{SearchKind, SearchQuery, Symbol, SymbolTreeCache};
use nova_project::ProjectGraph;
use nova_scheduler::CancellationToken;

mod dispatch;
mod engine;
mod error;
mod materialize;
mod worker;

pub use dispatch::{
    query_descriptor, query_from_descriptor, DispatchOutcome, DispatchState, DispatchTrace,
    Dispatcher, RemoteHostClient,
};
pub use engine::SearchEngine;
pub use error::SearchError;
pub use materialize::{dedup_within_projects, resolve, resolve_all, to_descriptor};
pub use worker::InProcessWorker;

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// What a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    Project(ProjectId),
    /// Every project, in solution order.
    Solution,
}

impl SearchTarget {
    pub fn project(self) -> Option<ProjectId> {
        match self {
            SearchTarget::Project(id) => Some(id),
            SearchTarget::Solution => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    pub filter: SymbolFilter,
    pub scope: SearchScope,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            filter: SymbolFilter::ALL,
            scope: SearchScope::SourceOnly,
        }
    }
}

impl SearchOptions {
    pub fn with_filter(mut self, filter: SymbolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Public declaration-search surface.
#[derive(Clone)]
pub struct SymbolFinder {
    dispatcher: Dispatcher,
}

impl SymbolFinder {
    pub fn new(cache: Arc<SymbolTreeCache>) -> Self {
        Self {
            dispatcher: Dispatcher::new(SearchEngine::new(cache)),
        }
    }

    /// Builds a finder with its own cache, sized and persisted as
    /// configured. A remote host still has to be attached with
    /// [`SymbolFinder::with_remote`].
    pub fn from_config(config: &SearchConfig) -> Self {
        let mut cache = SymbolTreeCache::new(config.index_cache.capacity);
        if let Some(dir) = &config.index_cache.persist_dir {
            cache = cache.with_persist_dir(dir);
        }
        Self::new(Arc::new(cache))
            .with_edit_distance_fallback(config.fuzzy.edit_distance_fallback)
            .with_remote_enabled(config.remote.enabled)
    }

    pub fn with_remote(mut self, client: Arc<dyn RemoteHostClient>) -> Self {
        self.dispatcher = self.dispatcher.with_remote(client);
        self
    }

    pub fn with_remote_enabled(mut self, enabled: bool) -> Self {
        self.dispatcher = self.dispatcher.with_remote_enabled(enabled);
        self
    }

    pub fn with_edit_distance_fallback(mut self, enabled: bool) -> Self {
        let engine = self
            .dispatcher
            .engine()
            .clone()
            .with_edit_distance_fallback(enabled);
        self.dispatcher = self.dispatcher.with_engine(engine);
        self
    }

    pub fn engine(&self) -> &SearchEngine {
        self.dispatcher.engine()
    }

    pub fn cache(&self) -> &Arc<SymbolTreeCache> {
        self.engine().cache()
    }

    /// Runs any query and reports where it ran.
    pub async fn search(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        self.dispatcher
            .dispatch(graph, target, query, options, token)
            .await
    }

    /// Declarations named exactly `name`.
    ///
    /// `name` is matched as a simple name; `A.B` is not a qualified lookup.
    /// Empty or whitespace-only names match nothing.
    pub async fn find_declarations(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        name: &str,
        ignore_case: bool,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>> {
        let query = SearchQuery::by_name(name, ignore_case);
        Ok(self.search(graph, target, &query, options, token).await?.symbols)
    }

    /// Declarations whose simple name satisfies `predicate`.
    ///
    /// Always runs locally.
    pub async fn find_declarations_with_predicate<F>(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        predicate: F,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let query = SearchQuery::predicate(predicate);
        Ok(self.search(graph, target, &query, options, token).await?.symbols)
    }

    /// Declarations matching the camel-case or prefix `pattern`, best match
    /// first within each project.
    pub async fn find_declarations_with_pattern(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        pattern: &str,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>> {
        let query = SearchQuery::fuzzy(pattern);
        Ok(self.search(graph, target, &query, options, token).await?.symbols)
    }

    /// Runs a shippable query against one project.
    ///
    /// Predicate queries are rejected with
    /// [`SearchError::UnsupportedQueryKind`].
    pub async fn find_all_declarations_with_normal_query(
        &self,
        graph: &dyn ProjectGraph,
        project: ProjectId,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>> {
        if query.kind() == SearchKind::Predicate {
            return Err(SearchError::UnsupportedQueryKind(SearchKind::Predicate));
        }
        let target = SearchTarget::Project(project);
        Ok(self.search(graph, target, query, options, token).await?.symbols)
    }
}
