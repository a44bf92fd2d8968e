use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Method,
    Constructor,
    Property,
    Field,
    Event,
}

/// Coarse classification used by [`SymbolFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Namespace,
    Type,
    Member,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 11] = [
        SymbolKind::Namespace,
        SymbolKind::Class,
        SymbolKind::Struct,
        SymbolKind::Interface,
        SymbolKind::Enum,
        SymbolKind::Delegate,
        SymbolKind::Method,
        SymbolKind::Constructor,
        SymbolKind::Property,
        SymbolKind::Field,
        SymbolKind::Event,
    ];

    pub const fn category(self) -> SymbolCategory {
        match self {
            SymbolKind::Namespace => SymbolCategory::Namespace,
            SymbolKind::Class
            | SymbolKind::Struct
            | SymbolKind::Interface
            | SymbolKind::Enum
            | SymbolKind::Delegate => SymbolCategory::Type,
            SymbolKind::Method
            | SymbolKind::Constructor
            | SymbolKind::Property
            | SymbolKind::Field
            | SymbolKind::Event => SymbolCategory::Member,
        }
    }

    /// Whether symbols of this kind are told apart by their parameter list.
    pub const fn has_parameter_list(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Constructor)
    }

    /// Whether symbols of this kind can contain other declarations.
    pub const fn is_container(self) -> bool {
        !matches!(self.category(), SymbolCategory::Member)
    }

    /// Stable one-byte tag used by binary encodings.
    pub const fn tag(self) -> u8 {
        match self {
            SymbolKind::Namespace => 0,
            SymbolKind::Class => 1,
            SymbolKind::Struct => 2,
            SymbolKind::Interface => 3,
            SymbolKind::Enum => 4,
            SymbolKind::Delegate => 5,
            SymbolKind::Method => 6,
            SymbolKind::Constructor => 7,
            SymbolKind::Property => 8,
            SymbolKind::Field => 9,
            SymbolKind::Event => 10,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Namespace => "namespace",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Delegate => "delegate",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Property => "property",
            SymbolKind::Field => "field",
            SymbolKind::Event => "event",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared accessibility of a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl Accessibility {
    /// Visible to code outside the declaring assembly (`public` or `protected`).
    pub const fn is_externally_visible(self) -> bool {
        matches!(self, Accessibility::Public | Accessibility::Protected)
    }

    pub const fn tag(self) -> u8 {
        match self {
            Accessibility::Public => 0,
            Accessibility::Protected => 1,
            Accessibility::Internal => 2,
            Accessibility::Private => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Accessibility::Public),
            1 => Some(Accessibility::Protected),
            2 => Some(Accessibility::Internal),
            3 => Some(Accessibility::Private),
            _ => None,
        }
    }
}

/// Where a symbol was declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolOrigin {
    /// The project's own documents.
    #[default]
    Source,
    /// A referenced library.
    Metadata,
}

impl SymbolOrigin {
    pub const fn tag(self) -> u8 {
        match self {
            SymbolOrigin::Source => 0,
            SymbolOrigin::Metadata => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SymbolOrigin::Source),
            1 => Some(SymbolOrigin::Metadata),
            _ => None,
        }
    }
}

/// Which declarations a search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Declarations in the project's own documents.
    #[default]
    SourceOnly,
    /// Also the public surface of referenced libraries.
    SourceAndMetadata,
}

/// Set of symbol categories a search should return.
///
/// `NONE` is a valid filter and always yields an empty result.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SymbolFilter(u8);

impl SymbolFilter {
    pub const NONE: SymbolFilter = SymbolFilter(0);
    pub const NAMESPACE: SymbolFilter = SymbolFilter(1 << 0);
    pub const TYPE: SymbolFilter = SymbolFilter(1 << 1);
    pub const MEMBER: SymbolFilter = SymbolFilter(1 << 2);
    pub const TYPE_AND_MEMBER: SymbolFilter = SymbolFilter(Self::TYPE.0 | Self::MEMBER.0);
    pub const ALL: SymbolFilter = SymbolFilter(Self::NAMESPACE.0 | Self::TYPE_AND_MEMBER.0);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `None` when `bits` carries flags outside [`SymbolFilter::ALL`].
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: SymbolFilter) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn for_category(category: SymbolCategory) -> Self {
        match category {
            SymbolCategory::Namespace => Self::NAMESPACE,
            SymbolCategory::Type => Self::TYPE,
            SymbolCategory::Member => Self::MEMBER,
        }
    }

    pub const fn matches(self, kind: SymbolKind) -> bool {
        self.0 & Self::for_category(kind.category()).0 != 0
    }
}

impl Default for SymbolFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SymbolFilter {
    type Output = SymbolFilter;

    fn bitor(self, rhs: Self) -> Self::Output {
        SymbolFilter(self.0 | rhs.0)
    }
}

impl BitOrAssign for SymbolFilter {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SymbolFilter {
    type Output = SymbolFilter;

    fn bitand(self, rhs: Self) -> Self::Output {
        SymbolFilter(self.0 & rhs.0)
    }
}

impl From<SymbolFilter> for u8 {
    fn from(filter: SymbolFilter) -> u8 {
        filter.0
    }
}

impl TryFrom<u8> for SymbolFilter {
    type Error = ParseFilterError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        SymbolFilter::from_bits(bits).ok_or_else(|| ParseFilterError(format!("0x{bits:02x}")))
    }
}

const FLAG_NAMES: [(SymbolFilter, &str); 3] = [
    (SymbolFilter::NAMESPACE, "namespace"),
    (SymbolFilter::TYPE, "type"),
    (SymbolFilter::MEMBER, "member"),
];

impl fmt::Debug for SymbolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("SymbolFilter(none)");
        }
        f.write_str("SymbolFilter(")?;
        let mut first = true;
        for (flag, name) in FLAG_NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// Error returned when a textual or numeric filter cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterError(String);

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid symbol filter `{}`", self.0)
    }
}

impl std::error::Error for ParseFilterError {}

impl FromStr for SymbolFilter {
    type Err = ParseFilterError;

    /// Parses a comma or `|` separated list such as `type,member`, or one of
    /// `all` / `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = SymbolFilter::NONE;
        for part in s.split([',', '|']).map(str::trim) {
            out |= match part.to_ascii_lowercase().as_str() {
                "all" => SymbolFilter::ALL,
                "none" => SymbolFilter::NONE,
                "namespace" | "namespaces" => SymbolFilter::NAMESPACE,
                "type" | "types" => SymbolFilter::TYPE,
                "member" | "members" => SymbolFilter::MEMBER,
                _ => return Err(ParseFilterError(part.to_string())),
            };
        }
        Ok(out)
    }
}
