//! Name matching primitives for declaration search.
//!
//! Patterns are matched against identifiers in tiers, strongest first:
//! exact, prefix, word-start substring, camel-case abbreviation (`tc` matches
//! `TestCase`), and finally a whole-name edit-distance fallback for short
//! alphabetic patterns. Matching is ASCII case-insensitive; non-ASCII bytes
//! must match exactly and punctuation is never treated as a wildcard.

#![forbid(unsafe_code)]

mod scoring;

pub use scoring::{
    edit_distance_threshold, pattern_match, MatchKind, MatchScore, PatternMatcher, RankKey,
};
