//! Per-project symbol trees for declaration search.
//!
//! A [`SymbolTreeIndex`] is an immutable name tree built from one project
//! snapshot. It answers exact, case-insensitive, fuzzy and predicate lookups
//! and can be written to and read back from a compact binary form.
//! [`SymbolTreeCache`] keeps built trees keyed by content fingerprint so
//! repeated searches over an unchanged project never rebuild.

mod cache;
mod error;
mod persistence;
mod query;
mod symbol;
mod symbol_tree;

pub use cache::{SymbolTreeCache, DEFAULT_CACHE_CAPACITY};
pub use error::IndexError;
pub use persistence::{
    load_persisted_index, persist_index, persisted_index_path, INDEX_FORMAT_VERSION, INDEX_MAGIC,
};
pub use query::{NamePredicate, SearchKind, SearchQuery};
pub use symbol::Symbol;
pub use symbol_tree::{
    FindOptions, NodeId, SymbolHandle, SymbolInfo, SymbolTreeIndex, SymbolTreeNode,
};

pub use nova_core::SymbolOrigin;
