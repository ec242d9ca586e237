//! Integration package tool.
//!
//! Formats and maintains integration packages: versioned bundles of
//! manifests, field definitions, pipelines and dashboards. The core is a
//! comment-preserving YAML engine that canonicalizes documents and edits
//! them without losing comments, quoting or key order.
//!
//! The public API is organised into four layers:
//!
//! - **[`document`]**: parse, edit and serialize comment-preserving document trees
//! - **[`formatter`]**: canonical YAML and JSON formatting, per file and per package
//! - **[`changelog`]**: revision history model and comment-preserving patching
//! - **[`commands`]**: top-level subcommand orchestration (`format`, `changelog add`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod changelog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod formatter;
pub mod logging;
