//! Federated Content Search Gateway Library
//!
//! This library crate defines the core modules of the SRU/FCS gateway.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The gateway is composed of loosely coupled subsystems:
//!
//! - **`broker`**: The asynchronous work broker. Publishes typed concordance jobs
//!   onto a shared queue, wakes idle workers over a notify channel, and correlates
//!   each result back to the calling request through a one-shot reply channel
//!   bounded by a deadline.
//! - **`config`**: TOML configuration (broker connection, server identity,
//!   database metadata, per-corpus resources).
//! - **`corpus`**: The resource registry. Static metadata about the exposed
//!   corpora with deterministic, sorted iteration so multi-corpus fan-out is
//!   reproducible.
//! - **`protocol`**: The versioned FCS request state machine (1.2 and 2.0).
//!   Validates the SRU parameter surface, drives the fan-out, joins results and
//!   assembles the response envelope with conformant diagnostics.
//! - **`query`**: The query translator. Lexer and LALR parser for the FCS query
//!   language producing an AST, plus a generator emitting the corpus engine's
//!   native query syntax with per-resource attribute substitution.
//! - **`render`**: Serializes the response envelope to XML or plain text.
//! - **`worker`**: The consume side of the broker contract. A notification-driven
//!   loop that executes jobs against a pluggable concordance engine.

pub mod broker;
pub mod config;
pub mod corpus;
pub mod protocol;
pub mod query;
pub mod render;
pub mod worker;
