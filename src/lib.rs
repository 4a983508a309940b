//! Scaffolds a Node.js project: renders templates into a new directory, installs
//! dependencies, lints, and optionally clones a remote and commits the result.

pub mod answers;
pub mod api;
mod banner;
pub mod catalog;
pub mod command;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod prompt;
pub mod source;
pub mod template;

pub use api::{kickoff, KickoffError, Outcome, Provisioner, Stage};
