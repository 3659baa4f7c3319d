//! Core types and shared functionality for stockbook.
//!
//! This crate provides:
//! - The catalog data model and product-code normalization
//! - The JSON-file cache store that makes runs resumable
//! - Layered configuration
//! - The colour-extraction heuristic shared by export and sync

pub mod cache;
pub mod catalog;
pub mod colour;
pub mod config;

pub use cache::{CacheData, CacheStore, CachedRecord};
pub use catalog::{
    CatalogEntry, MarketingCopy, Product, ProductDetail, ProductStockResult, StockRow, normalize_code,
};
pub use config::{AppConfig, ConfigError, DetailConfig, StockConfig};
