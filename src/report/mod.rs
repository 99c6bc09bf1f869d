//! Referee report generation: template lookup, form validation, field
//! resolution and PDF overlay rendering.

pub mod fields;
pub mod generator;
pub mod models;
pub mod pdf;
pub mod registry;
pub mod validation;

pub use generator::ReportGenerator;
pub use models::{GeneratedReport, ReportRequest};
pub use registry::{RegistryError, TemplateRegistry};
pub use validation::{validate, ValidationError};

use thiserror::Error;

use crate::storage::StorageError;
use pdf::RenderError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no template registered for {category} in {locality}")]
    TemplateNotFound { locality: String, category: String },
    #[error("required asset not found: {0}")]
    AssetNotFound(String),
    #[error(transparent)]
    Storage(StorageError),
    #[error("failed to render report: {0}")]
    Render(#[from] RenderError),
}
