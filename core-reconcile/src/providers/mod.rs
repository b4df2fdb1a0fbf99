//! External Catalog Providers
//!
//! This module contains clients for remote metadata catalogs:
//! - iTunes Search API - song metadata and album artwork locations
//!
//! Each provider implements the [`CatalogSearch`](crate::collaborators::CatalogSearch)
//! contract: failures are absorbed into empty result lists and never
//! propagate into the calling pipeline.

pub mod itunes;

pub use itunes::ItunesCatalog;
