//! goldt - golden-file regression runner for standalone compiled programs.
//!
//! Every `<name>.c` in the test directory is one test. `build` compiles it
//! next to its source, `run` executes the binary and compares what it prints
//! with `<name>.out.expected`, and `record` promotes the current behaviour to
//! the expected one after asking the operator.

pub mod case;
pub mod config;
pub mod confirm;
pub mod driver;
pub mod error;
pub mod report;
pub mod store;
pub mod toolchain;

pub use error::{GoldtError, Result};
