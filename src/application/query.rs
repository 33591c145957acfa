//! List query parameters: pagination and name filtering.

use serde::Deserialize;
use std::fmt;

use crate::error::{RegistryResult, ValidationError};

/// Page size applied when the caller does not pass `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Raw query string of `GET /applications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub filter: Option<String>,
}

/// Comparison supported by the `name` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    StartsWith,
    Contains,
    EndsWith,
}

impl FilterOperator {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "sw" => Some(Self::StartsWith),
            "co" => Some(Self::Contains),
            "ew" => Some(Self::EndsWith),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "eq",
            Self::StartsWith => "sw",
            Self::Contains => "co",
            Self::EndsWith => "ew",
        })
    }
}

/// `name <op> <value>` filter. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    pub operator: FilterOperator,
    pub value: String,
}

impl NameFilter {
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let invalid = |message: &str| ValidationError::InvalidFilter {
            filter: raw.to_string(),
            message: message.to_string(),
        };

        let mut parts = raw.trim().splitn(3, char::is_whitespace);
        let attribute = parts.next().unwrap_or_default();
        let operator = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default().trim();

        if !attribute.eq_ignore_ascii_case("name") {
            return Err(invalid("only the 'name' attribute can be filtered").into());
        }
        let operator = FilterOperator::parse(operator)
            .ok_or_else(|| invalid("operator must be eq, sw, co or ew"))?;

        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if value.is_empty() {
            return Err(invalid("filter value is empty").into());
        }

        Ok(Self {
            operator,
            value: value.to_string(),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self.operator {
            FilterOperator::Eq => name == self.value,
            FilterOperator::StartsWith => name.starts_with(&self.value),
            FilterOperator::Contains => name.contains(&self.value),
            FilterOperator::EndsWith => name.ends_with(&self.value),
        }
    }
}

/// Validated list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
    pub filter: Option<NameFilter>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            filter: None,
        }
    }
}

impl ListQuery {
    /// Validate raw query parameters.
    pub fn from_params(params: &ListParams, default_limit: usize) -> RegistryResult<Self> {
        let limit = match params.limit {
            None => default_limit,
            Some(limit) if limit > 0 => limit as usize,
            Some(_) => {
                return Err(ValidationError::InvalidPagination {
                    parameter: "limit".to_string(),
                    message: "must be a positive integer".to_string(),
                }
                .into());
            }
        };
        let offset = match params.offset {
            None => 0,
            Some(offset) if offset >= 0 => offset as usize,
            Some(_) => {
                return Err(ValidationError::InvalidPagination {
                    parameter: "offset".to_string(),
                    message: "must not be negative".to_string(),
                }
                .into());
            }
        };
        let filter = params
            .filter
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(NameFilter::parse)
            .transpose()?;

        Ok(Self {
            limit,
            offset,
            filter,
        })
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}
