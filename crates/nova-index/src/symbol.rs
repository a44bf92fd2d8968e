use std::fmt;
use std::sync::Arc;

use nova_core::{Accessibility, Location, ProjectId, SymbolKey, SymbolKind};

use crate::{SymbolHandle, SymbolInfo, SymbolOrigin, SymbolTreeIndex};

/// A process-local search result: one symbol of one project's index.
///
/// Two symbols are equal when they come from the same project and from
/// indexes with the same content fingerprint, since such indexes number
/// their symbols identically.
#[derive(Clone)]
pub struct Symbol {
    project: ProjectId,
    index: Arc<SymbolTreeIndex>,
    handle: SymbolHandle,
}

impl Symbol {
    /// `handle` must belong to `index`; use [`SymbolTreeIndex::symbol`] from
    /// outside this crate.
    pub(crate) fn new(project: ProjectId, index: Arc<SymbolTreeIndex>, handle: SymbolHandle) -> Self {
        Self {
            project,
            index,
            handle,
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn handle(&self) -> SymbolHandle {
        self.handle
    }

    pub fn index(&self) -> &Arc<SymbolTreeIndex> {
        &self.index
    }

    fn info(&self) -> &SymbolInfo {
        &self.index.symbols[self.handle.idx()]
    }

    pub fn name(&self) -> &str {
        &self.index.nodes[self.info().node.idx()].name
    }

    pub fn kind(&self) -> SymbolKind {
        self.info().kind
    }

    pub fn accessibility(&self) -> Accessibility {
        self.info().accessibility
    }

    pub fn origin(&self) -> SymbolOrigin {
        self.info().origin
    }

    pub fn arity(&self) -> u32 {
        self.info().arity
    }

    pub fn parameters(&self) -> &[String] {
        &self.info().parameters
    }

    pub fn locations(&self) -> &[Location] {
        &self.info().locations
    }

    /// The containing symbol, if any.
    pub fn container(&self) -> Option<Symbol> {
        let parent = self.info().parent?;
        Some(Symbol::new(self.project, Arc::clone(&self.index), parent))
    }

    pub fn key(&self) -> SymbolKey {
        // Handles held by a `Symbol` always belong to its index.
        self.index
            .key(self.handle)
            .unwrap_or_else(|| SymbolKey::new(Vec::new()))
    }

    /// Fully qualified display form, e.g. `TestCases.TestCase.Test(string[])`.
    pub fn display(&self) -> String {
        self.key().to_string()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project
            && self.handle == other.handle
            && (Arc::ptr_eq(&self.index, &other.index)
                || self.index.fingerprint() == other.index.fingerprint())
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.project.hash(state);
        self.handle.hash(state);
        self.index.fingerprint().hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}, {} {})", self.project, self.kind(), self.key())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
