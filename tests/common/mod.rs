//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{harvest_settings, MockCatalog, TestDb, QUERY_YOGA};
//!
//! #[tokio::test]
//! async fn test_harvest() {
//!     let db = TestDb::new();
//!     let catalog = MockCatalog::new().with_search(QUERY_YOGA, vec![]);
//!     // build a Harvester over `catalog` and `db.open_store()`
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;
mod mock_catalog;

pub use constants::*;
pub use fixtures::*;
pub use mock_catalog::MockCatalog;
