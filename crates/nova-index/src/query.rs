use std::fmt;
use std::sync::Arc;

/// Name predicate used by [`SearchQuery::Predicate`].
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What to look for in a symbol tree.
#[derive(Clone)]
pub enum SearchQuery {
    /// Case-sensitive name equality.
    Exact(String),
    /// Case-insensitive name equality.
    ExactIgnoreCase(String),
    /// Camel-case / prefix pattern (`tc` finds `TestCase`).
    Fuzzy(String),
    /// Arbitrary test on the simple name; always evaluated by full scan.
    Predicate(NamePredicate),
}

/// The shape of a [`SearchQuery`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Exact,
    ExactIgnoreCase,
    Fuzzy,
    Predicate,
}

impl SearchQuery {
    pub fn exact(name: impl Into<String>) -> Self {
        SearchQuery::Exact(name.into())
    }

    pub fn exact_ignore_case(name: impl Into<String>) -> Self {
        SearchQuery::ExactIgnoreCase(name.into())
    }

    /// `Exact` or `ExactIgnoreCase` depending on `ignore_case`.
    pub fn by_name(name: impl Into<String>, ignore_case: bool) -> Self {
        if ignore_case {
            SearchQuery::ExactIgnoreCase(name.into())
        } else {
            SearchQuery::Exact(name.into())
        }
    }

    pub fn fuzzy(pattern: impl Into<String>) -> Self {
        SearchQuery::Fuzzy(pattern.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        SearchQuery::Predicate(Arc::new(predicate))
    }

    pub fn kind(&self) -> SearchKind {
        match self {
            SearchQuery::Exact(_) => SearchKind::Exact,
            SearchQuery::ExactIgnoreCase(_) => SearchKind::ExactIgnoreCase,
            SearchQuery::Fuzzy(_) => SearchKind::Fuzzy,
            SearchQuery::Predicate(_) => SearchKind::Predicate,
        }
    }

    /// The searched name or pattern; `None` for predicates.
    pub fn name(&self) -> Option<&str> {
        match self {
            SearchQuery::Exact(name)
            | SearchQuery::ExactIgnoreCase(name)
            | SearchQuery::Fuzzy(name) => Some(name),
            SearchQuery::Predicate(_) => None,
        }
    }

    /// Empty or whitespace-only names match nothing, whatever the kind.
    pub fn is_blank(&self) -> bool {
        self.name().is_some_and(|name| name.trim().is_empty())
    }

    /// Predicates are local closures and cannot be shipped to another process.
    pub fn is_remote_eligible(&self) -> bool {
        self.kind().is_remote_eligible()
    }
}

impl SearchKind {
    pub fn is_remote_eligible(self) -> bool {
        !matches!(self, SearchKind::Predicate)
    }
}

impl fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            SearchQuery::ExactIgnoreCase(name) => {
                f.debug_tuple("ExactIgnoreCase").field(name).finish()
            }
            SearchQuery::Fuzzy(pattern) => f.debug_tuple("Fuzzy").field(pattern).finish(),
            SearchQuery::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
