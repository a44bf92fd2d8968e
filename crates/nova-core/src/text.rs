//! Source positions attached to declarations.

use crate::DocumentId;
use serde::{Deserialize, Serialize};

pub use text_size::{TextRange, TextSize};

/// A declaration site: the document it lives in and its byte range there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub document: DocumentId,
    pub range: TextRange,
}

impl Location {
    #[inline]
    pub const fn new(document: DocumentId, range: TextRange) -> Self {
        Self { document, range }
    }
}
