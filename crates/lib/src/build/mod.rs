//! Uberjar assembly.
//!
//! A build turns a [`BuildConfig`] into a single executable archive. The
//! pipeline is a fixed sequence of [`BuildStage`]s, each a function from the
//! previous state to the next. Any error aborts the build; nothing reaches the
//! output path until the final export succeeds.
//!
//! # Submodules
//!
//! - [`stages`] - The individual pipeline stages
//! - [`tool`] - [`BuildTool`], which runs them in order

pub mod stages;
pub mod tool;
mod types;

pub use tool::BuildTool;
pub use types::*;
