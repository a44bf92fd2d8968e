//! Structural symbol identity.
//!
//! Live symbols are process-local; a [`SymbolKey`] names the same declaration
//! by its container path, signature and origin so it can be re-resolved
//! against another copy of the same snapshot.

use crate::{SymbolKind, SymbolOrigin};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`SymbolKey`] path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeySegment {
    pub kind: SymbolKind,
    pub name: String,
    pub arity: u32,
    pub parameters: Vec<String>,
}

impl KeySegment {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            arity: 0,
            parameters: Vec::new(),
        }
    }

    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        if self.kind.has_parameter_list() {
            write!(f, "({})", self.parameters.join(", "))?;
        }
        Ok(())
    }
}

/// Path from the outermost container down to a symbol.
///
/// Rendered as `TestCases.TestCase.Test(string[])`. The origin is part of
/// the identity but not of the rendering: a source `System.String` and a
/// library `System.String` display alike and compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolKey {
    segments: Vec<KeySegment>,
    #[serde(default)]
    origin: SymbolOrigin,
}

impl SymbolKey {
    /// A key for a source declaration.
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self {
            segments,
            origin: SymbolOrigin::Source,
        }
    }

    pub fn with_origin(mut self, origin: SymbolOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> SymbolOrigin {
        self.origin
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&KeySegment> {
        self.segments.last()
    }

    /// Simple name of the symbol this key identifies.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", |s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn child(&self, segment: KeySegment) -> SymbolKey {
        let mut segments = self.segments.clone();
        segments.push(segment);
        SymbolKey {
            segments,
            origin: self.origin,
        }
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
