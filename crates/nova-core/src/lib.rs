//! Core shared types for Nova's declaration search.
//!
//! This crate is intentionally small: identifiers, symbol classification,
//! structural symbol keys and content fingerprints. Everything here is a plain
//! value type shared by the index, the wire protocol and the router.

mod fingerprint;
mod ids;
mod key;
mod symbol;
mod text;

pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use ids::{DocumentId, ProjectId};
pub use key::{KeySegment, SymbolKey};
pub use symbol::{
    Accessibility, ParseFilterError, SearchScope, SymbolCategory, SymbolFilter, SymbolKind,
    SymbolOrigin,
};
pub use text::{Location, TextRange, TextSize};
