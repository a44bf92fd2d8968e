//! Utilities shared by Nova tests.
//!
//! The canonical solution shapes used across the search tests live here so
//! every crate asserts against the same declarations. Each [`SolutionKind`]
//! builds an immutable [`Solution`]; projects are numbered from 1 in
//! solution order.

mod fixtures;

pub use fixtures::{
    large_solution, mscorlib, project_with, solution, solution_with, SolutionKind,
    LARGE_SOLUTION_PROJECTS,
};

use std::sync::Once;

/// Installs a test-friendly `tracing` subscriber once per test binary.
///
/// Output goes through the test writer so it is only shown for failing tests.
/// `RUST_LOG` controls verbosity (default: `warn`).
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
