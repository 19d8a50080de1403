//! Listing defaults.

use serde::{Deserialize, Serialize};

use crate::types::pagination::PaginationMode;

/// Process-wide pagination defaults applied by `list` when the caller does
/// not specify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Use length-aware pages (with totals) unless a request says otherwise.
    #[serde(default = "default_with_pages")]
    pub with_pages: bool,
    /// Page size used when a request has no `per_page`.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Upper bound for any requested page size.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,
}

impl PaginationConfig {
    /// The mode used when a request does not carry `with_pages`.
    pub fn default_mode(&self) -> PaginationMode {
        PaginationMode::from_with_pages(self.with_pages)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            with_pages: default_with_pages(),
            per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_with_pages() -> bool {
    true
}

fn default_per_page() -> u64 {
    15
}

fn default_max_per_page() -> u64 {
    100
}
