use std::sync::Arc;

use nova_core::ProjectId;
use nova_index::{FindOptions, SearchQuery, Symbol, SymbolTreeCache};
use nova_project::{Project, ProjectGraph};
use nova_scheduler::{CancellationToken, Cancelled};

use crate::{SearchError, SearchOptions, SearchTarget};

/// Runs queries against symbol trees built in this process.
///
/// Trees come from a shared [`SymbolTreeCache`], so an unchanged project is
/// indexed once no matter how many searches touch it.
#[derive(Clone)]
pub struct SearchEngine {
    cache: Arc<SymbolTreeCache>,
    edit_distance_fallback: bool,
}

impl SearchEngine {
    pub fn new(cache: Arc<SymbolTreeCache>) -> Self {
        Self {
            cache,
            edit_distance_fallback: true,
        }
    }

    pub fn with_edit_distance_fallback(mut self, enabled: bool) -> Self {
        self.edit_distance_fallback = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<SymbolTreeCache> {
        &self.cache
    }

    pub async fn search(
        &self,
        graph: &dyn ProjectGraph,
        target: SearchTarget,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>, SearchError> {
        match target {
            SearchTarget::Project(project) => {
                self.search_project(graph, project, query, options, token)
                    .await
            }
            SearchTarget::Solution => self.search_solution(graph, query, options, token).await,
        }
    }

    /// Searches one project.
    ///
    /// Fails with [`SearchError::UnknownProject`] when `project` is not in
    /// `graph`; blank names return nothing without building an index.
    pub async fn search_project(
        &self,
        graph: &dyn ProjectGraph,
        project: ProjectId,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>, SearchError> {
        Cancelled::check(token)?;
        let project = graph
            .project(project)
            .ok_or(SearchError::UnknownProject(project))?;
        self.search_loaded(&project, query, options, token).await
    }

    /// Searches every project in solution order and concatenates the
    /// results. The same declaration in two projects is reported twice.
    ///
    /// Cancellation is observed between projects; a cancelled search never
    /// returns the projects it already finished.
    pub async fn search_solution(
        &self,
        graph: &dyn ProjectGraph,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>, SearchError> {
        Cancelled::check(token)?;
        if is_trivially_empty(query, options) {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for id in graph.project_ids() {
            Cancelled::check(token)?;
            let project = graph.project(id).ok_or(SearchError::UnknownProject(id))?;
            results.extend(self.search_loaded(&project, query, options, token).await?);
        }
        Cancelled::check(token)?;
        Ok(results)
    }

    async fn search_loaded(
        &self,
        project: &Project,
        query: &SearchQuery,
        options: &SearchOptions,
        token: &CancellationToken,
    ) -> Result<Vec<Symbol>, SearchError> {
        if is_trivially_empty(query, options) {
            return Ok(Vec::new());
        }

        let index = self.cache.get_or_build(project, token).await?;
        let handles = index.find(query, &self.find_options(options));
        tracing::trace!(
            target = "nova.router",
            project = %project.id(),
            kind = ?query.kind(),
            matches = handles.len(),
            "searched symbol tree"
        );
        Ok(handles
            .into_iter()
            .filter_map(|handle| index.symbol(project.id(), handle))
            .collect())
    }

    fn find_options(&self, options: &SearchOptions) -> FindOptions {
        FindOptions {
            filter: options.filter,
            scope: options.scope,
            edit_distance_fallback: self.edit_distance_fallback,
        }
    }
}

pub(crate) fn is_trivially_empty(query: &SearchQuery, options: &SearchOptions) -> bool {
    query.is_blank() || options.filter.is_empty()
}
