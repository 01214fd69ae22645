//! Offline variant checking.
//!
//! Runs the same validation and normalization the API applies to product
//! writes, so operators can vet an import file before sending it.

use std::path::Path;

use catalog_core::{validate_and_normalize_variants, NormalizedVariant, VariantInput};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum CheckError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("file is not a JSON array of variants: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("variants rejected: {0}")]
    Rejected(String),
}

/// Parses `raw` as a JSON array of variants and returns the normalized list.
///
/// # Errors
///
/// Returns [`CheckError::Parse`] for malformed JSON and
/// [`CheckError::Rejected`] with the validation reason otherwise.
pub(crate) fn check_variants_json(raw: &str) -> Result<Vec<NormalizedVariant>, CheckError> {
    let inputs: Vec<VariantInput> = serde_json::from_str(raw)?;
    validate_and_normalize_variants(Some(inputs.as_slice()))
        .map_err(|e| CheckError::Rejected(e.reason().to_owned()))
}

pub(crate) fn run_check_variants(path: &Path, compact: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).map_err(|source| CheckError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let normalized = check_variants_json(&raw)?;
    tracing::info!(count = normalized.len(), file = %path.display(), "variants valid");

    let rendered = if compact {
        serde_json::to_string(&normalized)?
    } else {
        serde_json::to_string_pretty(&normalized)?
    };
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_a_valid_file() {
        let normalized = check_variants_json(
            r#"[
                {"size": " M ", "color": "Red", "stock": 0},
                {"sku": "TEE-1", "stock": 4, "price": 12.5, "available": false}
            ]"#,
        )
        .expect("valid variants");

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].size.as_deref(), Some("M"));
        assert!(normalized[0].available);
        assert_eq!(normalized[1].sku.as_deref(), Some("TEE-1"));
        assert_eq!(normalized[1].price, Some(12.5));
        assert!(!normalized[1].available);
    }

    #[test]
    fn reports_the_validation_reason() {
        let err = check_variants_json(r#"[{"sku": "A", "stock": 1}, {"sku": "A", "stock": 2}]"#)
            .unwrap_err();
        assert!(matches!(err, CheckError::Rejected(ref reason) if reason == "Duplicate SKU: A"));
    }

    #[test]
    fn rejects_non_array_json() {
        let err = check_variants_json(r#"{"sku": "A"}"#).unwrap_err();
        assert!(matches!(err, CheckError::Parse(_)));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(check_variants_json("[]").expect("empty").is_empty());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = run_check_variants(Path::new("/nonexistent/variants.json"), false).unwrap_err();
        assert!(err.to_string().starts_with("could not read /nonexistent/variants.json"));
    }
}
