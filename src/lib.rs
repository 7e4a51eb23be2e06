//! # Knowledge Base
//!
//! A small service for storing short knowledge snippets. Every snippet is
//! labelled Technical, Urgent, or General by a two-layer tagger: a remote
//! zero-shot classifier first, with keyword matching as the fallback.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌──────────┐
//! │ HTTP API │──▶│ Tagger                   │   │  SQLite  │
//! │  (axum)  │   │ remote ──fail──▶ keywords│   │ snippets │
//! └────┬─────┘   └──────────────────────────┘   └────▲─────┘
//!      └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kb init                          # create database
//! kb tag "prod is down, fix asap"  # try the tagger
//! kb serve                         # start HTTP server
//! kb list --tag Urgent
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Tag, Snippet, content validation |
//! | [`keywords`] | Keyword fallback classifier |
//! | [`remote`] | Remote zero-shot classifier |
//! | [`tagger`] | Remote-then-keyword orchestration |
//! | [`store`] | Snippet storage trait and backends |
//! | [`server`] | HTTP API |
//! | [`commands`] | CLI command implementations |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod commands;
pub mod config;
pub mod db;
pub mod keywords;
pub mod migrate;
pub mod models;
pub mod remote;
pub mod server;
pub mod store;
pub mod tagger;
