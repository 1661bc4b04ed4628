//! Project-level defaults layered under CLI flags: `.sdqctl/config.toml`
//! relative to the workflow's working directory, same load-or-None idiom
//! as the teacher's `ProjectConfig::load`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load `.sdqctl/config.toml` relative to `project_root`. Returns
    /// `None` if no such file exists; a malformed file is an error.
    pub fn load(project_root: &Path) -> anyhow::Result<Option<Self>> {
        let path = project_root.join(".sdqctl").join("config.toml");
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?;
        Ok(Some(config))
    }
}

/// Everything `run` needs that isn't inherent to the parsed workflow,
/// with CLI flags taking priority over an optional project config file,
/// taking priority over built-in defaults.
pub struct WorkflowRunConfig {
    pub workspace_root: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub adapter: String,
}

impl WorkflowRunConfig {
    pub fn resolve(workspace_root: PathBuf, cli_adapter: &str) -> anyhow::Result<Self> {
        let project = ProjectConfig::load(&workspace_root)?.unwrap_or_default();
        let checkpoint_dir = project
            .checkpoint_dir
            .unwrap_or_else(|| default_checkpoint_dir(&workspace_root));
        let adapter = if cli_adapter == "mock" {
            project.adapter.unwrap_or_else(|| cli_adapter.to_string())
        } else {
            cli_adapter.to_string()
        };
        Ok(Self {
            workspace_root,
            checkpoint_dir,
            adapter,
        })
    }
}

fn default_checkpoint_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".sdqctl").join("checkpoints")
}
