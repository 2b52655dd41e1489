//! Shared utilities

pub mod env;
pub mod fs;
pub mod process;

pub use env::{BootstrapEnv, Transport};
pub use process::ProcessBuilder;
