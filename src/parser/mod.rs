//! HTML parsing and data extraction
//!
//! This module reads balancer-manager pages: it detects the Apache version
//! and extracts raw cluster and worker records from the page tables.

pub mod page;
pub mod selectors;
pub mod version;

// Re-export main parser and public types
pub use page::{parse_page, RawCluster, RawPage, RawRoute};
pub use version::{detect, ApacheVersion};
