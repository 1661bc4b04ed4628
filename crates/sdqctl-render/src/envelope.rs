//! The versioned JSON envelope emitted per cycle. `schema_version`
//! follows `major.minor`; only major bumps may break consumers.

use sdqctl_core::TemplateVars;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEnvelope {
    pub schema_version: String,
    pub cycle: u32,
    pub adapter: Option<String>,
    pub model: Option<String>,
    pub max_cycles: Option<u32>,
    pub template_variables: TemplateVars,
    pub prompts: Vec<ResolvedPrompt>,
    pub context_files: Vec<ContextFileRendered>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrompt {
    pub raw: String,
    pub resolved: String,
    pub elide_group: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFileRendered {
    pub path: String,
    pub content: String,
}
