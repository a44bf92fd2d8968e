//! Library wrapper around the `nova` CLI implementation.
//!
//! The CLI is exercised through its binary (`src/main.rs`) and the integration
//! tests in `tests/cli.rs`. `cargo test -p nova-cli --lib` is a quick way to
//! typecheck it without building the binary test suite, so the binary crate
//! root is compiled here as a module.
//!
//! `fn main()` inside `main.rs` is just another function when compiled as a module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
