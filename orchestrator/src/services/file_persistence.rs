//! JSON file persistence for finished carousels

use std::path::PathBuf;
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use shared::CarouselRun;
use crate::error::PersistenceError;
use crate::traits::CarouselPersistence;

/// Writes each run to `<output_dir>/<title>-<run_id>.json`
pub struct JsonFilePersistence {
    output_dir: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Target file for a run
    pub fn path_for(&self, run: &CarouselRun) -> PathBuf {
        let title = sanitize_title(&run.title);
        let file_name = if title.is_empty() {
            format!("{}.json", run.run_id)
        } else {
            format!("{}-{}.json", title, run.run_id)
        };
        self.output_dir.join(file_name)
    }
}

/// Lowercase, alphanumerics only, words joined with underscores
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}

#[async_trait]
impl CarouselPersistence for JsonFilePersistence {
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.output_dir).await?;

        let path = self.path_for(run);
        let contents = serde_json::to_string_pretty(run)?;
        fs::write(&path, contents).await?;

        info!("Saved carousel {} to {}", run.run_id, path.display());
        Ok(())
    }
}
