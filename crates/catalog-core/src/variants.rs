//! Normalization and validation of product variant payloads.
//!
//! Variants arrive as whatever the request layer decoded. String fields are
//! typed, but `stock`, `price`, and `available` keep the raw JSON value when it
//! has the wrong type so that [`validate_variants`] can report the problem
//! against the offending variant.

use std::collections::HashSet;
use std::num::FpCategory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::normalize_text;

/// A numeric variant field as it arrived in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    /// Any JSON value that is not a number (string, bool, object, ...).
    Invalid(serde_json::Value),
}

impl NumberField {
    /// Returns the value if it is a finite number.
    #[must_use]
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

/// A boolean variant field as it arrived in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagField {
    Flag(bool),
    Invalid(serde_json::Value),
}

/// Raw variant record from a product create/update request.
///
/// A JSON `null` in any field is read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<NumberField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NumberField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<FlagField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Canonical variant shape that gets persisted with its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub stock: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl From<&NormalizedVariant> for VariantInput {
    fn from(variant: &NormalizedVariant) -> Self {
        Self {
            size: variant.size.clone(),
            color: variant.color.clone(),
            name: variant.name.clone(),
            stock: Some(NumberField::Number(variant.stock)),
            price: variant.price.map(NumberField::Number),
            available: Some(FlagField::Flag(variant.available)),
            sku: variant.sku.clone(),
        }
    }
}

/// Why a variant list was rejected. The reason is meant to be shown to the
/// API caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct VariantValidationError {
    reason: String,
}

impl VariantValidationError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Normalizes a single variant: trims text fields, collapses blanks to `None`,
/// defaults a falsy stock to `0` and a missing `available` flag to `true`.
#[must_use]
pub fn normalize_variant(variant: &VariantInput) -> NormalizedVariant {
    let stock = match &variant.stock {
        Some(NumberField::Number(n))
            if !matches!(n.classify(), FpCategory::Zero | FpCategory::Nan) =>
        {
            *n
        }
        _ => 0.0,
    };
    let price = match &variant.price {
        Some(NumberField::Number(n)) => Some(*n),
        _ => None,
    };
    let available = match &variant.available {
        Some(FlagField::Flag(flag)) => *flag,
        _ => true,
    };

    NormalizedVariant {
        size: normalize_text(variant.size.as_deref()),
        color: normalize_text(variant.color.as_deref()),
        name: normalize_text(variant.name.as_deref()),
        stock,
        price,
        available,
        sku: normalize_text(variant.sku.as_deref()),
    }
}

/// Normalizes a variant list, preserving order. Absent input yields an empty list.
#[must_use]
pub fn normalize_variants(variants: Option<&[VariantInput]>) -> Vec<NormalizedVariant> {
    variants
        .unwrap_or_default()
        .iter()
        .map(normalize_variant)
        .collect()
}

/// Checks a variant list, stopping at the first broken rule.
///
/// Per variant the rules run in this order: identity (size, color, or sku),
/// duplicate sku, duplicate size/color pair, stock, price, available flag.
/// Duplicate detection spans the whole list. Size, color, and sku are
/// compared after trimming.
///
/// # Errors
///
/// Returns [`VariantValidationError`] describing the first failure.
pub fn validate_variants(variants: Option<&[VariantInput]>) -> Result<(), VariantValidationError> {
    let Some(variants) = variants else {
        return Ok(());
    };

    let mut seen_skus: HashSet<String> = HashSet::new();
    let mut seen_combos: HashSet<(String, String)> = HashSet::new();

    for (index, variant) in variants.iter().enumerate() {
        let position = index + 1;
        let size = normalize_text(variant.size.as_deref());
        let color = normalize_text(variant.color.as_deref());
        let sku = normalize_text(variant.sku.as_deref());

        if size.is_none() && color.is_none() && sku.is_none() {
            return Err(VariantValidationError::new(format!(
                "Variant {position} must have at least one of: size, color, or sku"
            )));
        }

        if let Some(sku) = &sku {
            if !seen_skus.insert(sku.clone()) {
                return Err(VariantValidationError::new(format!("Duplicate SKU: {sku}")));
            }
        }

        if let (Some(size), Some(color)) = (&size, &color) {
            if !seen_combos.insert((size.clone(), color.clone())) {
                return Err(VariantValidationError::new(format!(
                    "Duplicate variant with size \"{size}\" and color \"{color}\""
                )));
            }
        }

        let label = || {
            variant_label(
                position,
                variant.name.as_deref().filter(|name| !name.is_empty()),
                size.as_deref(),
                color.as_deref(),
                sku.as_deref(),
            )
        };

        let stock_ok = variant
            .stock
            .as_ref()
            .and_then(NumberField::as_finite)
            .is_some_and(|stock| stock >= 0.0);
        if !stock_ok {
            return Err(VariantValidationError::new(format!(
                "Invalid stock value for {}. Stock must be a non-negative number",
                label()
            )));
        }

        if let Some(price) = &variant.price {
            if !price.as_finite().is_some_and(|price| price >= 0.0) {
                return Err(VariantValidationError::new(format!(
                    "Invalid price for {}. Price must be a non-negative number",
                    label()
                )));
            }
        }

        if matches!(variant.available, Some(FlagField::Invalid(_))) {
            return Err(VariantValidationError::new(format!(
                "Invalid available flag for variant {position}. Must be a boolean"
            )));
        }
    }

    Ok(())
}

/// Validates and then normalizes, which is what create/update handlers need.
///
/// # Errors
///
/// Returns [`VariantValidationError`] if [`validate_variants`] rejects the list.
pub fn validate_and_normalize_variants(
    variants: Option<&[VariantInput]>,
) -> Result<Vec<NormalizedVariant>, VariantValidationError> {
    validate_variants(variants)?;
    Ok(normalize_variants(variants))
}

fn variant_label(
    position: usize,
    name: Option<&str>,
    size: Option<&str>,
    color: Option<&str>,
    sku: Option<&str>,
) -> String {
    if let Some(name) = name {
        return name.to_owned();
    }
    match (size, color) {
        (Some(size), Some(color)) => format!("size \"{size}\" color \"{color}\""),
        (Some(size), None) => format!("size \"{size}\""),
        (None, Some(color)) => format!("color \"{color}\""),
        (None, None) => sku.map_or_else(|| format!("variant {position}"), ToOwned::to_owned),
    }
}

#[cfg(test)]
#[path = "variants_test.rs"]
mod tests;
