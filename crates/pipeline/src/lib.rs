//! Catalog pipeline: orchestration, reconciliation, and output.
//!
//! The scrape crate produces per-source records; this crate sequences the
//! passes over the product list, merges the sources into catalog entries,
//! and writes the CSV/JSON exports. Everything here is browser-free: the
//! orchestrator only sees the source traits, so the whole pipeline runs
//! under test with fakes.

pub mod export;
pub mod products;
pub mod reconcile;
pub mod run;
pub mod sync;
