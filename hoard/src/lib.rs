//! hoard: a content-addressed archival store for single files.
//!
//! A file is digested, looked up by name in the store's manifest, and then
//! either reported as already stored, rejected as a name conflict, or
//! compressed into the store and registered exactly once. The `hoard` binary
//! is a thin wrapper around [`engine::Store`].
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`codec`] - Streaming compression codecs
//! - [`commands`] - Subcommand handlers
//! - [`config`] - Store configuration and TOML loading
//! - [`copier`] - Chunked stream transfer
//! - [`digest`] - Incremental content digests
//! - [`engine`] - Ingestion, extraction, and verification
//! - [`error`] - Error types and exit statuses
//! - [`list_output`] - Output formatting for manifest listing
//! - [`lock`] - Advisory store lock
//! - [`naming`] - Artifact naming policy
//! - [`output`] - Progress and result messages
//! - [`registry`] - Durable JSON manifest

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod copier;
pub mod digest;
pub mod engine;
pub mod error;
pub mod list_output;
pub mod lock;
pub mod naming;
pub mod output;
pub mod registry;
