//! Upload directory setup.

use std::path::Path;

use studybot_bot::services::FileStorage;

use super::CommandError;

/// Create `projects/` and `orders/` under the uploads directory.
///
/// # Errors
///
/// Returns error if a directory cannot be created.
pub async fn run(uploads_dir: &Path) -> Result<(), CommandError> {
    FileStorage::new(uploads_dir).init().await?;
    tracing::info!(path = %uploads_dir.display(), "Upload directories ready");
    Ok(())
}
