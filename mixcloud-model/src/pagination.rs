//! Pagination parameters for resource lists
//!
//! A list request is paginated either with the API's own parameters
//! (`offset`, `limit`, `since`, `until`) or with a page number and page
//! size, which are translated into `offset` and `limit`. Mixing the two
//! families is a caller error.

use crate::constants::DEFAULT_PER_PAGE;
use crate::datetime::{to_timestamp, DateTimeLike};
use crate::error::{ModelError, Result};
use serde::Deserialize;

/// Query string parameters, in insertion order
pub type QueryParams = Vec<(String, String)>;

/// Pagination options for list requests
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Number of resources to skip
    pub offset: Option<u64>,
    /// Maximum number of resources to return
    pub limit: Option<u64>,
    /// Only resources created after this point in time
    pub since: Option<DateTimeLike>,
    /// Only resources created before this point in time
    pub until: Option<DateTimeLike>,
    /// Zero-based page number; excludes every option above
    pub page: Option<u64>,
    /// Page size used with `page` (default: 20)
    pub per_page: Option<u64>,
}

impl Pagination {
    /// No pagination options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paginate by page number.
    pub fn page(page: u64) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Set `offset`.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set `limit`.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set `since`.
    pub fn with_since(mut self, since: impl Into<DateTimeLike>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Set `until`.
    pub fn with_until(mut self, until: impl Into<DateTimeLike>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size used with the page number.
    pub fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.offset.is_none()
            && self.limit.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.page.is_none()
    }

    /// Translate into API query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PreconditionViolation`] if `page` is combined
    /// with any of `offset`, `limit`, `since` or `until`, and
    /// [`ModelError::InvalidDateTime`] if `since`/`until` cannot be read.
    pub fn to_params(&self) -> Result<QueryParams> {
        let mut offset = self.offset;
        let mut limit = self.limit;

        if let Some(page) = self.page {
            if offset.is_some() || limit.is_some() || self.since.is_some() || self.until.is_some()
            {
                return Err(ModelError::PreconditionViolation(
                    "page and offset/limit/since/until cannot be specified simultaneously"
                        .to_string(),
                ));
            }
            let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
            offset = Some(page.saturating_mul(per_page));
            limit = Some(per_page);
        }

        let mut params = QueryParams::new();
        if let Some(offset) = offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(since) = &self.since {
            params.push(("since".to_string(), to_timestamp(since.clone())?.to_string()));
        }
        if let Some(until) = &self.until {
            params.push(("until".to_string(), to_timestamp(until.clone())?.to_string()));
        }
        Ok(params)
    }
}
