use nova_core::{Accessibility, DocumentId, SymbolKind, TextRange, TextSize};
use serde::{Deserialize, Serialize};

/// A declaration as the parser reported it.
///
/// Parsers recover from broken source, so a declaration may carry an empty or
/// whitespace-only name; consumers are expected to cope with that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub arity: u32,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub range: TextRange,
    #[serde(default)]
    pub children: Vec<Declaration>,
}

impl Declaration {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            accessibility: Accessibility::Public,
            arity: 0,
            parameters: Vec::new(),
            range: TextRange::default(),
            children: Vec::new(),
        }
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Namespace, name)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Class, name)
    }

    pub fn method<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SymbolKind::Method, name).with_parameters(parameters)
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Property, name)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Field, name)
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Event, name)
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
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

    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.range = TextRange::new(TextSize::from(start), TextSize::from(end.max(start)));
        self
    }

    pub fn with_child(mut self, child: Declaration) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Declaration>) -> Self {
        self.children.extend(children);
        self
    }

    /// Pre-order walk over this declaration and everything nested in it.
    pub fn walk(&self) -> impl Iterator<Item = &Declaration> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// A source document and the declarations parsed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl Document {
    pub fn new(id: DocumentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }
}

/// A referenced library, described by the declarations it exposes.
///
/// Only `public` and `protected` declarations are visible to searches that
/// include metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataReference {
    pub name: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl MetadataReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }
}
