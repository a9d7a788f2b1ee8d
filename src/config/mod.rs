//! Configuration module
//!
//! Loading and validation of YAML catalog files, plus runtime session
//! settings.

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{CatalogLimits, CatalogLoader, LoadResult, LoadWarning};
pub use schema::{CatalogConfig, TransitionConfig};
pub use settings::SessionSettings;
pub use validation::{ValidationResult, Validator};
