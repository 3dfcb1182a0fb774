use tracing::debug;

use crate::domain::error::AssertionError;
use crate::engine::validate::FieldValidator;
use crate::response::ResponseSource;

use super::ResponseValidator;

pub const CURRENT_PAGE_KEY: &str = "current_page";
pub const TOTAL_KEY: &str = "total";
pub const PER_PAGE_KEY: &str = "per_page";
pub const LAST_PAGE_KEY: &str = "last_page";

impl<R: ResponseSource, V: FieldValidator> ResponseValidator<R, V> {
    /// Prefixes subsequent pagination lookups with `namespace`
    /// (`meta.pagination` → `meta.pagination.total`). An empty namespace
    /// looks keys up at the top level.
    pub fn under_pagination_namespace(&mut self, namespace: &str) -> &mut Self {
        self.pagination_namespace = namespace.trim_matches('.').to_string();
        debug!(namespace = %self.pagination_namespace, "pagination namespace set");
        self
    }

    pub fn pagination_namespace(&self) -> &str {
        &self.pagination_namespace
    }

    /// Effective path of a pagination key under the current namespace.
    pub fn pagination_key(&self, key: &str) -> String {
        if self.pagination_namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.pagination_namespace)
        }
    }

    pub fn see_current_page(&self, page: u64) -> Result<&Self, AssertionError> {
        self.see_current_page_at(page, CURRENT_PAGE_KEY)
    }

    pub fn see_current_page_at(&self, page: u64, key: &str) -> Result<&Self, AssertionError> {
        self.see_value_at_key(&self.pagination_key(key), page)
    }

    pub fn see_total_results(&self, total: u64) -> Result<&Self, AssertionError> {
        self.see_total_results_at(total, TOTAL_KEY)
    }

    pub fn see_total_results_at(&self, total: u64, key: &str) -> Result<&Self, AssertionError> {
        self.see_value_at_key(&self.pagination_key(key), total)
    }

    pub fn see_results_per_page(&self, per_page: u64) -> Result<&Self, AssertionError> {
        self.see_results_per_page_at(per_page, PER_PAGE_KEY)
    }

    pub fn see_results_per_page_at(
        &self,
        per_page: u64,
        key: &str,
    ) -> Result<&Self, AssertionError> {
        self.see_value_at_key(&self.pagination_key(key), per_page)
    }

    pub fn see_total_pages(&self, last_page: u64) -> Result<&Self, AssertionError> {
        self.see_total_pages_at(last_page, LAST_PAGE_KEY)
    }

    pub fn see_total_pages_at(&self, last_page: u64, key: &str) -> Result<&Self, AssertionError> {
        self.see_value_at_key(&self.pagination_key(key), last_page)
    }
}
