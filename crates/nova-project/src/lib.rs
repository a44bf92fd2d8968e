//! Immutable project graph consumed by Nova's declaration search.
//!
//! A [`Solution`] is an ordered set of [`Project`] snapshots; each project
//! holds documents of parsed [`Declaration`]s plus the public surface of
//! referenced libraries. Nothing here parses source text: declarations arrive
//! already extracted, possibly from broken code.

mod error;
mod load;
mod model;
mod project;
mod solution;

pub use error::ProjectError;
pub use load::{load_solution, SolutionFile};
pub use model::{Declaration, Document, MetadataReference};
pub use project::{Project, ProjectInfo};
pub use solution::{ProjectGraph, Solution};
