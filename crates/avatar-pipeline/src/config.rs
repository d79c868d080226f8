use serde::Deserialize;
use std::path::PathBuf;

fn default_max_drafts() -> usize {
    3
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("audios/work")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("audios")
}

/// Pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Drafts beyond this count are dropped from the completion output.
    #[serde(default = "default_max_drafts")]
    pub max_drafts: usize,

    /// Root under which per-request artifact directories are created.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Directory holding the static fallback clips and tracks.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Leave request directories on disk after the response is built.
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_drafts: default_max_drafts(),
            work_dir: default_work_dir(),
            assets_dir: default_assets_dir(),
            keep_artifacts: false,
        }
    }
}
