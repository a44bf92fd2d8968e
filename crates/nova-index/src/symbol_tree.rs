use std::collections::HashMap;
use std::sync::Arc;

use nova_core::{
    Accessibility, DocumentId, Fingerprint, KeySegment, Location, ProjectId, SearchScope,
    SymbolFilter, SymbolKey, SymbolKind, SymbolOrigin,
};
use nova_fuzzy::{PatternMatcher, RankKey};
use nova_project::{Declaration, Document, MetadataReference, Project};
use nova_scheduler::{CancellationToken, Cancelled};

use crate::{SearchQuery, Symbol};

/// Identifies a symbol within one [`SymbolTreeIndex`].
///
/// Handles are assigned in node pre-order, so a container's handle is always
/// smaller than the handles of the symbols it contains. They are meaningless
/// outside the index that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolHandle(u32);

impl SymbolHandle {
    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a node of the name tree. [`NodeId::ROOT`] is the global namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One name in the tree, shared by every symbol with that simple name under
/// the same container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTreeNode {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) symbols: Vec<SymbolHandle>,
}

impl SymbolTreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn symbols(&self) -> &[SymbolHandle] {
        &self.symbols
    }
}

/// Everything the index knows about one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub kind: SymbolKind,
    pub accessibility: Accessibility,
    pub origin: SymbolOrigin,
    pub arity: u32,
    pub parameters: Vec<String>,
    /// Containing symbol, if any.
    pub parent: Option<SymbolHandle>,
    pub node: NodeId,
    /// Every declaration site; partial declarations contribute one each.
    /// Empty for metadata symbols.
    pub locations: Vec<Location>,
}

/// Restrictions applied to every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub filter: SymbolFilter,
    pub scope: SearchScope,
    /// Retry fuzzy lookups by edit distance when nothing matched.
    pub edit_distance_fallback: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            filter: SymbolFilter::ALL,
            scope: SearchScope::SourceOnly,
            edit_distance_fallback: true,
        }
    }
}

impl FindOptions {
    pub fn with_filter(mut self, filter: SymbolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NameEntry {
    pub(crate) folded: String,
    pub(crate) node: NodeId,
}

/// Immutable searchable name tree over one project snapshot.
///
/// Built once per content fingerprint; safe to share between concurrent
/// readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTreeIndex {
    pub(crate) fingerprint: Fingerprint,
    pub(crate) nodes: Vec<SymbolTreeNode>,
    pub(crate) symbols: Vec<SymbolInfo>,
    /// Non-root nodes sorted by (lowercased name, name, node).
    names: Vec<NameEntry>,
}

impl SymbolTreeIndex {
    /// Builds the index for `project`.
    ///
    /// Never fails on malformed declarations: names are trimmed, and a
    /// declaration without a usable name is skipped while its members are
    /// indexed under the enclosing container.
    pub fn build(project: &Project) -> Self {
        let mut builder = TreeBuilder::new();
        for doc in project.documents() {
            builder.insert_document(doc);
        }
        for reference in project.metadata_references() {
            builder.insert_metadata(reference);
        }
        builder.finish(project.content_fingerprint())
    }

    /// Like [`SymbolTreeIndex::build`], polling `token` between documents.
    pub fn build_cancellable(
        project: &Project,
        token: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let mut builder = TreeBuilder::new();
        for doc in project.documents() {
            Cancelled::check(token)?;
            builder.insert_document(doc);
        }
        for reference in project.metadata_references() {
            Cancelled::check(token)?;
            builder.insert_metadata(reference);
        }
        Ok(builder.finish(project.content_fingerprint()))
    }

    pub(crate) fn from_parts(
        fingerprint: Fingerprint,
        nodes: Vec<SymbolTreeNode>,
        symbols: Vec<SymbolInfo>,
    ) -> Self {
        let mut names: Vec<NameEntry> = nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, node)| NameEntry {
                folded: node.name.to_lowercase(),
                node: NodeId(idx as u32),
            })
            .collect();
        names.sort_by(|a, b| {
            a.folded
                .cmp(&b.folded)
                .then_with(|| nodes[a.node.idx()].name.cmp(&nodes[b.node.idx()].name))
                .then(a.node.cmp(&b.node))
        });
        Self {
            fingerprint,
            nodes,
            symbols,
            names,
        }
    }

    /// Content fingerprint of the project snapshot this index was built from.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn root(&self) -> &SymbolTreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&SymbolTreeNode> {
        self.nodes.get(id.idx())
    }

    pub fn info(&self, handle: SymbolHandle) -> Option<&SymbolInfo> {
        self.symbols.get(handle.idx())
    }

    pub fn name(&self, handle: SymbolHandle) -> Option<&str> {
        let info = self.info(handle)?;
        Some(self.nodes[info.node.idx()].name.as_str())
    }

    pub fn handles(&self) -> impl Iterator<Item = SymbolHandle> + '_ {
        (0..self.symbols.len() as u32).map(SymbolHandle)
    }

    /// Wraps `handle` into a live [`Symbol`]; `None` when the handle does not
    /// belong to this index.
    pub fn symbol(self: &Arc<Self>, project: ProjectId, handle: SymbolHandle) -> Option<Symbol> {
        self.info(handle)?;
        Some(Symbol::new(project, Arc::clone(self), handle))
    }

    /// Runs `query`, returning matching handles.
    ///
    /// Exact, case-insensitive and predicate results come back in handle
    /// order. Fuzzy results are ordered best match first, then by handle.
    pub fn find(&self, query: &SearchQuery, options: &FindOptions) -> Vec<SymbolHandle> {
        if options.filter.is_empty() || query.is_blank() {
            return Vec::new();
        }
        match query {
            SearchQuery::Exact(name) => self.find_by_name(name, false, options),
            SearchQuery::ExactIgnoreCase(name) => self.find_by_name(name, true, options),
            SearchQuery::Fuzzy(pattern) => self.find_by_pattern(pattern, options),
            SearchQuery::Predicate(predicate) => {
                let predicate: &(dyn Fn(&str) -> bool + Send + Sync) = &**predicate;
                self.handles()
                    .filter(|&h| self.accepts(h, options))
                    .filter(|&h| predicate(self.node_of(h).name.as_str()))
                    .collect()
            }
        }
    }

    fn node_of(&self, handle: SymbolHandle) -> &SymbolTreeNode {
        &self.nodes[self.symbols[handle.idx()].node.idx()]
    }

    fn accepts(&self, handle: SymbolHandle, options: &FindOptions) -> bool {
        let info = &self.symbols[handle.idx()];
        options.filter.matches(info.kind)
            && (options.scope == SearchScope::SourceAndMetadata
                || info.origin == SymbolOrigin::Source)
    }

    fn folded_range(&self, folded: &str) -> &[NameEntry] {
        let start = self.names.partition_point(|e| e.folded.as_str() < folded);
        let len = self.names[start..]
            .iter()
            .take_while(|e| e.folded == folded)
            .count();
        &self.names[start..start + len]
    }

    fn find_by_name(
        &self,
        name: &str,
        ignore_case: bool,
        options: &FindOptions,
    ) -> Vec<SymbolHandle> {
        let folded = name.to_lowercase();
        let mut out: Vec<SymbolHandle> = self
            .folded_range(&folded)
            .iter()
            .map(|entry| &self.nodes[entry.node.idx()])
            .filter(|node| ignore_case || node.name == name)
            .flat_map(|node| node.symbols.iter().copied())
            .filter(|&h| self.accepts(h, options))
            .collect();
        out.sort_unstable();
        out
    }

    fn find_by_pattern(&self, pattern: &str, options: &FindOptions) -> Vec<SymbolHandle> {
        let Some(mut matcher) = PatternMatcher::new(pattern) else {
            return Vec::new();
        };

        // Distinct names with at least one symbol passing the filters.
        let mut groups: Vec<(&str, Vec<SymbolHandle>)> = Vec::new();
        let mut i = 0;
        while i < self.names.len() {
            let name = self.nodes[self.names[i].node.idx()].name.as_str();
            let mut j = i + 1;
            while j < self.names.len() && self.nodes[self.names[j].node.idx()].name == name {
                j += 1;
            }
            let handles: Vec<SymbolHandle> = self.names[i..j]
                .iter()
                .flat_map(|e| self.nodes[e.node.idx()].symbols.iter().copied())
                .filter(|&h| self.accepts(h, options))
                .collect();
            if !handles.is_empty() {
                groups.push((name, handles));
            }
            i = j;
        }

        let mut scored: Vec<(RankKey, SymbolHandle)> = Vec::new();
        for (name, handles) in &groups {
            if let Some(score) = matcher.score(name) {
                let key = score.rank_key();
                scored.extend(handles.iter().map(|&h| (key, h)));
            }
        }
        if scored.is_empty() && options.edit_distance_fallback && matcher.supports_edit_distance()
        {
            for (name, handles) in &groups {
                if let Some(score) = matcher.score_edit_distance(name) {
                    let key = score.rank_key();
                    scored.extend(handles.iter().map(|&h| (key, h)));
                }
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, h)| h).collect()
    }

    /// Structural key of `handle`: its container path plus signature.
    pub fn key(&self, handle: SymbolHandle) -> Option<SymbolKey> {
        let origin = self.info(handle)?.origin;
        let mut segments = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            let info = &self.symbols[h.idx()];
            segments.push(
                KeySegment::new(info.kind, self.nodes[info.node.idx()].name.clone())
                    .with_arity(info.arity)
                    .with_parameters(info.parameters.iter().cloned()),
            );
            current = info.parent;
        }
        segments.reverse();
        Some(SymbolKey::new(segments).with_origin(origin))
    }

    /// Finds the symbol `key` names, if it still exists in this index.
    pub fn resolve_key(&self, key: &SymbolKey) -> Option<SymbolHandle> {
        if key.is_empty() {
            return None;
        }
        // Several containers can share a path (a source namespace and a
        // metadata namespace of the same name), so track every candidate.
        // Containers always share their members' origin.
        let origin = key.origin();
        let mut candidates: Vec<(NodeId, Option<SymbolHandle>)> = vec![(NodeId::ROOT, None)];
        for segment in key.segments() {
            let mut next = Vec::new();
            for &(node, parent) in &candidates {
                let Some(child) = self.nodes[node.idx()]
                    .children
                    .iter()
                    .copied()
                    .find(|c| self.nodes[c.idx()].name == segment.name)
                else {
                    continue;
                };
                for &h in &self.nodes[child.idx()].symbols {
                    let info = &self.symbols[h.idx()];
                    if info.parent == parent
                        && info.origin == origin
                        && info.kind == segment.kind
                        && info.arity == segment.arity
                        && info.parameters == segment.parameters
                    {
                        next.push((child, Some(h)));
                    }
                }
            }
            if next.is_empty() {
                return None;
            }
            candidates = next;
        }
        candidates.first().and_then(|&(_, h)| h)
    }
}

#[derive(Hash, PartialEq, Eq)]
struct MergeKey {
    parent: Option<usize>,
    node: usize,
    kind: SymbolKind,
    arity: u32,
    parameters: Vec<String>,
    origin: SymbolOrigin,
}

struct ProtoNode {
    name: String,
    parent: usize,
    children: Vec<usize>,
    by_name: HashMap<String, usize>,
    symbols: Vec<usize>,
}

struct ProtoSymbol {
    kind: SymbolKind,
    accessibility: Accessibility,
    origin: SymbolOrigin,
    arity: u32,
    parameters: Vec<String>,
    parent: Option<usize>,
    node: usize,
    locations: Vec<Location>,
}

/// Insertion-order tree, renumbered into pre-order by [`TreeBuilder::finish`].
struct TreeBuilder {
    nodes: Vec<ProtoNode>,
    symbols: Vec<ProtoSymbol>,
    merged: HashMap<MergeKey, usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            nodes: vec![ProtoNode {
                name: String::new(),
                parent: 0,
                children: Vec::new(),
                by_name: HashMap::new(),
                symbols: Vec::new(),
            }],
            symbols: Vec::new(),
            merged: HashMap::new(),
        }
    }

    fn child_node(&mut self, parent: usize, name: &str) -> usize {
        if let Some(&node) = self.nodes[parent].by_name.get(name) {
            return node;
        }
        let node = self.nodes.len();
        self.nodes.push(ProtoNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            by_name: HashMap::new(),
            symbols: Vec::new(),
        });
        self.nodes[parent].children.push(node);
        self.nodes[parent].by_name.insert(name.to_string(), node);
        node
    }

    fn insert_document(&mut self, doc: &Document) {
        for decl in &doc.declarations {
            self.insert(decl, None, 0, SymbolOrigin::Source, Some(doc.id));
        }
    }

    fn insert_metadata(&mut self, reference: &MetadataReference) {
        for decl in &reference.declarations {
            self.insert(decl, None, 0, SymbolOrigin::Metadata, None);
        }
    }

    fn insert(
        &mut self,
        decl: &Declaration,
        parent_symbol: Option<usize>,
        parent_node: usize,
        origin: SymbolOrigin,
        document: Option<DocumentId>,
    ) {
        if origin == SymbolOrigin::Metadata && !decl.accessibility.is_externally_visible() {
            return;
        }

        let name = decl.name.trim();
        if name.is_empty() {
            for child in &decl.children {
                self.insert(child, parent_symbol, parent_node, origin, document);
            }
            return;
        }

        let node = self.child_node(parent_node, name);
        let key = MergeKey {
            parent: parent_symbol,
            node,
            kind: decl.kind,
            arity: decl.arity,
            parameters: decl.parameters.clone(),
            origin,
        };
        let symbol = match self.merged.get(&key) {
            Some(&symbol) => symbol,
            None => {
                let symbol = self.symbols.len();
                self.symbols.push(ProtoSymbol {
                    kind: decl.kind,
                    accessibility: decl.accessibility,
                    origin,
                    arity: decl.arity,
                    parameters: decl.parameters.clone(),
                    parent: parent_symbol,
                    node,
                    locations: Vec::new(),
                });
                self.nodes[node].symbols.push(symbol);
                self.merged.insert(key, symbol);
                symbol
            }
        };
        if let Some(document) = document {
            self.symbols[symbol]
                .locations
                .push(Location::new(document, decl.range));
        }

        for child in &decl.children {
            self.insert(child, Some(symbol), node, origin, document);
        }
    }

    fn finish(self, fingerprint: Fingerprint) -> SymbolTreeIndex {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node].children.iter().rev());
        }

        let mut node_map = vec![0u32; self.nodes.len()];
        for (new, &old) in order.iter().enumerate() {
            node_map[old] = new as u32;
        }
        let mut symbol_map = vec![0u32; self.symbols.len()];
        let mut next_symbol = 0u32;
        for &old_node in &order {
            for &old_symbol in &self.nodes[old_node].symbols {
                symbol_map[old_symbol] = next_symbol;
                next_symbol += 1;
            }
        }

        let mut nodes: Vec<Option<SymbolTreeNode>> = vec![None; self.nodes.len()];
        for (old, proto) in self.nodes.into_iter().enumerate() {
            nodes[node_map[old] as usize] = Some(SymbolTreeNode {
                name: proto.name,
                parent: (old != 0).then(|| NodeId(node_map[proto.parent])),
                children: proto.children.iter().map(|&c| NodeId(node_map[c])).collect(),
                symbols: proto
                    .symbols
                    .iter()
                    .map(|&s| SymbolHandle(symbol_map[s]))
                    .collect(),
            });
        }

        let mut symbols: Vec<Option<SymbolInfo>> = vec![None; self.symbols.len()];
        for (old, proto) in self.symbols.into_iter().enumerate() {
            symbols[symbol_map[old] as usize] = Some(SymbolInfo {
                kind: proto.kind,
                accessibility: proto.accessibility,
                origin: proto.origin,
                arity: proto.arity,
                parameters: proto.parameters,
                parent: proto.parent.map(|p| SymbolHandle(symbol_map[p])),
                node: NodeId(node_map[proto.node]),
                locations: proto.locations,
            });
        }

        // Both maps are bijections, so every slot is filled.
        let nodes = nodes.into_iter().flatten().collect();
        let symbols = symbols.into_iter().flatten().collect();
        SymbolTreeIndex::from_parts(fingerprint, nodes, symbols)
    }
}
