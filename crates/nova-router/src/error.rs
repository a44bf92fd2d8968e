use nova_core::ProjectId;
use nova_index::{IndexError, SearchKind};
use nova_scheduler::Cancelled;

/// Failures surfaced to callers of the search entry points.
///
/// Remote transport problems never show up here; they trigger a local
/// fallback instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0} is not part of the solution")]
    UnknownProject(ProjectId),

    #[error("{0:?} queries are not supported by this operation")]
    UnsupportedQueryKind(SearchKind),

    #[error("search cancelled")]
    Cancelled,

    #[error("failed to build symbol index: {0}")]
    Index(#[source] IndexError),
}

impl From<Cancelled> for SearchError {
    fn from(_: Cancelled) -> Self {
        SearchError::Cancelled
    }
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Cancelled => SearchError::Cancelled,
            other => SearchError::Index(other),
        }
    }
}
