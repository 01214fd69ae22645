//! Small catalog rules shared by the product, category, and user endpoints.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Price must be a non-negative number")]
    InvalidPrice,
    #[error("ratingsAverage must be a number between 0 and 5")]
    InvalidRatingsAverage,
    #[error("ratingsCount must be a non-negative integer")]
    InvalidRatingsCount,
    #[error("Invalid role: {0}. Must be 'user' or 'admin'")]
    InvalidRole(String),
}

/// Trims a text field, collapsing empty and all-whitespace values to `None`.
#[must_use]
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Canonical slug form: trimmed and lower-cased.
#[must_use]
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

/// Checks the numeric product fields that the store does not constrain on its own.
///
/// # Errors
///
/// Returns the first [`CatalogError`] found, checking price, then the ratings.
pub fn validate_product_numbers(
    price: Option<f64>,
    ratings_average: Option<f64>,
    ratings_count: Option<i64>,
) -> Result<(), CatalogError> {
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(CatalogError::InvalidPrice);
        }
    }
    if let Some(avg) = ratings_average {
        if !(0.0..=5.0).contains(&avg) {
            return Err(CatalogError::InvalidRatingsAverage);
        }
    }
    if ratings_count.is_some_and(|count| count < 0) {
        return Err(CatalogError::InvalidRatingsCount);
    }
    Ok(())
}

/// Account role carried in tokens and stored on the user row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(CatalogError::InvalidRole(other.to_string())),
        }
    }
}

/// Page window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Builds a page window from raw query values.
    ///
    /// Missing, unparsable, or non-positive values fall back to page 1 and
    /// [`DEFAULT_PAGE_SIZE`]; the page size is capped at [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v > 0)
        };
        Self {
            page: parse(page).unwrap_or(1),
            page_size: parse(limit).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    #[must_use]
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.page_size - 1) / self.page_size
    }
}
