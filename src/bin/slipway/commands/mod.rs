//! Command implementations

pub mod add;
pub mod bootstrap;
pub mod completions;
pub mod resolve;
