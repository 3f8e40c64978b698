//! Core types and the graph consistency engine for kinmap.
//!
//! This crate is deliberately free of database and terminal dependencies.
//! Storage backends implement [`store::EntityStore`]; everything that mutates
//! more than one record goes through [`engine::GraphEngine`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod boundary;
pub mod cascade;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod search;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result, ValidationError};
