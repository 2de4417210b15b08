//! staqd - stacked pull request orchestration
//!
//! This library keeps a tree of dependent pull requests consistent as ancestors
//! are rebased or merged, and merges whole stacks in dependency order.
//!
//! # Architecture
//!
//! The engine only talks to the outside world through two traits:
//! - [`platform::PlatformService`] for the code-hosting API (GitHub)
//! - [`vcs::Vcs`] for the local git working tree
//!
//! Everything above those seams (metadata, discovery, restack, merge) is plain
//! async code that can be driven by the bundled CLI, a CI job reacting to PR
//! comments, or tests with in-memory doubles.

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod graph;
pub mod guide;
pub mod merge;
pub mod metadata;
pub mod platform;
pub mod progress;
pub mod report;
pub mod restack;
pub mod types;
pub mod vcs;

pub use error::{Error, Result};
pub use types::*;
