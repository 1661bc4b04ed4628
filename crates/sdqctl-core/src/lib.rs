//! Shared error taxonomy and closed-enum types used across the
//! sdqctl workflow engine crates.

pub mod error;
pub mod types;

pub use error::EngineError;
pub use types::{
    OnErrorPolicy, OutputCapturePolicy, OutputFormat, SessionMode, TemplateVars, ValidationMode,
    BUILTIN_TEMPLATE_VARS, WORKFLOW_NAME_SENTINEL,
};
