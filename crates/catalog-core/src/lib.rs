//! Domain rules for the catalog backend: variant normalization, address and
//! catalog validation, and application configuration.

pub mod addresses;
pub mod app_config;
pub mod catalog;
pub mod config;
pub mod variants;

use thiserror::Error;

pub use addresses::{validate_addresses, Address, AddressInput, AddressValidationError, AddressesInput};
pub use app_config::{AppConfig, Environment};
pub use catalog::{
    normalize_slug, normalize_text, validate_product_numbers, CatalogError, Pagination, Role,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use variants::{
    normalize_variant, normalize_variants, validate_and_normalize_variants, validate_variants,
    FlagField, NormalizedVariant, NumberField, VariantInput, VariantValidationError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
