//! Go toolchain adapters
//!
//! Worker binaries are compiled with `go build` and checks are `go test`
//! invocations inside the exchange source tree.

pub mod go_builder;
pub mod go_test_runner;

pub use go_builder::GoBuilder;
pub use go_test_runner::GoTestRunner;
